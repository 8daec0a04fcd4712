use crate::error::QuillIndexError;

/// Column types an index can be built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Boolean,
    Int32,
    Float32,
    Float64,
    Varchar,
}

impl KeyType {
    /// Encoded width of every key of this type, `None` for variable length types.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            KeyType::Boolean => Some(1),
            KeyType::Int32 | KeyType::Float32 => Some(4),
            KeyType::Float64 => Some(8),
            KeyType::Varchar => None,
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl TryFrom<&str> for KeyType {
    type Error = QuillIndexError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let name = value.trim().to_ascii_lowercase();
        let key_type = match name.as_str() {
            "bool" | "boolean" => KeyType::Boolean,
            "int" | "integer" | "int32" => KeyType::Int32,
            "float" | "real" | "float32" => KeyType::Float32,
            "double" | "float64" => KeyType::Float64,
            "varchar" | "text" | "string" => KeyType::Varchar,
            _ => {
                return Err(QuillIndexError::NotSupport(format!(
                    "Not support key type {}",
                    value
                )))
            }
        };
        Ok(key_type)
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::KeyType;
    use crate::error::QuillIndexError;

    #[test]
    fn parse_key_type() {
        assert_eq!(KeyType::try_from("INTEGER").unwrap(), KeyType::Int32);
        assert_eq!(KeyType::try_from("double").unwrap(), KeyType::Float64);
        assert_eq!(KeyType::try_from(" Float ").unwrap(), KeyType::Float32);
        assert_eq!(KeyType::try_from("text").unwrap(), KeyType::Varchar);
        assert_eq!(KeyType::try_from("bool").unwrap(), KeyType::Boolean);

        assert!(matches!(
            KeyType::try_from("decimal"),
            Err(QuillIndexError::NotSupport(_))
        ));
    }

    #[test]
    fn fixed_width() {
        assert_eq!(KeyType::Boolean.fixed_width(), Some(1));
        assert_eq!(KeyType::Int32.fixed_width(), Some(4));
        assert_eq!(KeyType::Float64.fixed_width(), Some(8));
        assert_eq!(KeyType::Varchar.fixed_width(), None);
    }
}
