#![forbid(unsafe_code)]

pub mod lineage;
pub mod schema;

pub mod ids {
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct TenantId(String);

    impl TenantId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, TenantIdError> {
            let value = value.into();
            validate_tenant_id(&value)?;
            Ok(Self(value))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum TenantIdError {
        Empty,
        TooLong,
        InvalidFirstChar,
        InvalidChar { ch: char, index: usize },
    }

    impl TenantIdError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::Empty => "tenant id must not be empty",
                Self::TooLong => "tenant id is too long",
                Self::InvalidFirstChar => "tenant id must start with an alphanumeric character",
                Self::InvalidChar { .. } => "tenant id contains an invalid character",
            }
        }
    }

    fn validate_tenant_id(value: &str) -> Result<(), TenantIdError> {
        if value.is_empty() {
            return Err(TenantIdError::Empty);
        }
        if value.len() > 128 {
            return Err(TenantIdError::TooLong);
        }
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return Err(TenantIdError::Empty);
        };
        if !first.is_ascii_alphanumeric() {
            return Err(TenantIdError::InvalidFirstChar);
        }
        for (index, ch) in value.chars().enumerate() {
            if index == 0 {
                continue;
            }
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-' | '@') {
                continue;
            }
            return Err(TenantIdError::InvalidChar { ch, index });
        }
        Ok(())
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct BatchId(String);

    impl BatchId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, BatchIdError> {
            let value = value.into();
            validate_batch_id(&value)?;
            Ok(Self(value))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum BatchIdError {
        Empty,
        TooLong,
        InvalidFirstChar,
        InvalidChar { ch: char, index: usize },
    }

    impl BatchIdError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::Empty => "batch id must not be empty",
                Self::TooLong => "batch id is too long",
                Self::InvalidFirstChar => "batch id must start with an alphanumeric character",
                Self::InvalidChar { .. } => "batch id contains an invalid character",
            }
        }
    }

    fn validate_batch_id(value: &str) -> Result<(), BatchIdError> {
        if value.is_empty() {
            return Err(BatchIdError::Empty);
        }
        if value.len() > 64 {
            return Err(BatchIdError::TooLong);
        }
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return Err(BatchIdError::Empty);
        };
        if !first.is_ascii_alphanumeric() {
            return Err(BatchIdError::InvalidFirstChar);
        }
        for (index, ch) in value.chars().enumerate() {
            if index == 0 {
                continue;
            }
            if ch.is_ascii_alphanumeric() || ch == '-' {
                continue;
            }
            return Err(BatchIdError::InvalidChar { ch, index });
        }
        Ok(())
    }

    /// Derives a human-legible batch id from the stage name and a per-tenant
    /// counter value, e.g. stage "Cosecha" + counter 1 -> `COS-00000001`.
    pub fn derive_batch_id(stage_name: &str, counter: i64) -> String {
        let mut prefix = String::with_capacity(3);
        for ch in stage_name.chars() {
            if ch.is_ascii_alphabetic() {
                prefix.push(ch.to_ascii_uppercase());
                if prefix.len() == 3 {
                    break;
                }
            }
        }
        if prefix.is_empty() {
            prefix.push_str("LOT");
        }
        format!("{prefix}-{:08X}", counter.max(0))
    }
}
