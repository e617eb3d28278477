use uuid::Uuid;

/// Correlation id that follows one evaluation pass or bootstrap run.
#[derive(Clone, Debug)]
pub struct TraceId(String);

impl TraceId {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self(Uuid::new_v4().as_hyphenated().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = TraceId::default();
        let b = TraceId::default();

        assert_ne!(a.as_str(), b.as_str());
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn explicit_id_is_kept() {
        assert_eq!(TraceId::new("pass-1").as_str(), "pass-1");
    }
}
