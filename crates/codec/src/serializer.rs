//! Serializer abstraction.

/// Turns a value into an encoded form.
///
/// Implementations hold no per-call state and may be invoked concurrently
/// from any worker thread.
pub trait Serializer<T: ?Sized>: Send + Sync {
    /// Encoded form (bytes, text, structured value).
    type Output;

    /// Error raised when a value cannot be encoded.
    type Error;

    /// Get the format name, used in logs.
    fn format(&self) -> &str;

    /// Encode a value.
    fn encode(&self, value: &T) -> Result<Self::Output, Self::Error>;
}

/// A serializer backed by a closure.
pub struct FnSerializer<F> {
    format: String,
    f: F,
}

impl<F> FnSerializer<F> {
    /// Wrap a closure under the given format name.
    pub fn new(format: impl Into<String>, f: F) -> Self {
        Self {
            format: format.into(),
            f,
        }
    }
}

impl<F, T, O, E> Serializer<T> for FnSerializer<F>
where
    T: ?Sized,
    F: Fn(&T) -> Result<O, E> + Send + Sync,
{
    type Output = O;
    type Error = E;

    fn format(&self) -> &str {
        &self.format
    }

    fn encode(&self, value: &T) -> Result<O, E> {
        (self.f)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_serializer() {
        let serializer = FnSerializer::new("decimal", |value: &u32| -> Result<String, String> {
            Ok(value.to_string())
        });

        assert_eq!(Serializer::<u32>::format(&serializer), "decimal");
        assert_eq!(serializer.encode(&42), Ok("42".to_string()));
    }

    #[test]
    fn test_fn_serializer_failure() {
        let serializer = FnSerializer::new("even", |value: &u32| {
            if value % 2 == 0 {
                Ok(*value)
            } else {
                Err(format!("{value} is odd"))
            }
        });

        assert_eq!(serializer.encode(&3), Err("3 is odd".to_string()));
    }
}
