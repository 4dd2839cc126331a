use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use strata_types::{ObjOpcode, OpKind};

use crate::error::ConfigResult;

/// Process-wide adapter options controlling dispatch.
///
/// The default configuration fakes nothing: every launch reaches the real
/// storage client. Test deployments mark individual operation kinds as
/// faked, or route the KV kinds through the in-memory KV service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AdapterOptions {
    /// Operation kinds whose launch is replaced by immediate fake success.
    pub faked: HashSet<OpKind>,
    /// When `true`, KV operation kinds are executed by the in-memory KV
    /// service instead of the storage client.
    pub fake_kv_service: bool,
}

impl AdapterOptions {
    /// Options that fake nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an operation kind as faked (builder style).
    pub fn with_faked(mut self, kind: OpKind) -> Self {
        self.faked.insert(kind);
        self
    }

    /// Route KV kinds through the in-memory KV service (builder style).
    pub fn with_fake_kv_service(mut self) -> Self {
        self.fake_kv_service = true;
        self
    }

    /// Is launch of this kind replaced by immediate fake success?
    pub fn is_faked(&self, kind: OpKind) -> bool {
        self.faked.contains(&kind)
    }

    /// Should this kind be executed by the in-memory KV service?
    pub fn use_fake_kv_service(&self, kind: OpKind) -> bool {
        self.fake_kv_service && kind.is_kv()
    }

    /// Must an object read be fabricated locally instead of forwarded?
    ///
    /// True when the opcode is `Read` and any of open/create/read object
    /// kinds are faked: a faked create or open leaves the client with no
    /// object to read from, so reads must be fabricated too.
    pub fn fakes_object_read(&self, opcode: ObjOpcode) -> bool {
        opcode == ObjOpcode::Read
            && (self.is_faked(OpKind::OpenObject)
                || self.is_faked(OpKind::CreateObject)
                || self.is_faked(OpKind::ReadObject))
    }

    /// Must sync barriers be faked?
    ///
    /// True when KV puts are faked or the fake KV service is on: a sync
    /// barrier over writes the client never saw would otherwise hang or
    /// fail spuriously.
    pub fn fake_sync(&self) -> bool {
        self.is_faked(OpKind::PutKv) || self.fake_kv_service
    }

    /// Parse options from a TOML string. Unknown keys are rejected.
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_fakes_nothing() {
        let opts = AdapterOptions::default();
        assert!(!opts.is_faked(OpKind::CreateObject));
        assert!(!opts.use_fake_kv_service(OpKind::GetKv));
        assert!(!opts.fakes_object_read(ObjOpcode::Read));
        assert!(!opts.fake_sync());
    }

    #[test]
    fn faked_kind_is_reported() {
        let opts = AdapterOptions::new().with_faked(OpKind::WriteObject);
        assert!(opts.is_faked(OpKind::WriteObject));
        assert!(!opts.is_faked(OpKind::ReadObject));
    }

    #[test]
    fn fake_kv_service_applies_to_kv_kinds_only() {
        let opts = AdapterOptions::new().with_fake_kv_service();
        assert!(opts.use_fake_kv_service(OpKind::GetKv));
        assert!(opts.use_fake_kv_service(OpKind::PutKv));
        assert!(opts.use_fake_kv_service(OpKind::DeleteKv));
        assert!(!opts.use_fake_kv_service(OpKind::CreateIndex));
        assert!(!opts.use_fake_kv_service(OpKind::WriteObject));
    }

    #[test]
    fn faked_create_implies_fabricated_reads() {
        let opts = AdapterOptions::new().with_faked(OpKind::CreateObject);
        assert!(opts.fakes_object_read(ObjOpcode::Read));
        assert!(!opts.fakes_object_read(ObjOpcode::Write));
    }

    #[test]
    fn faked_open_implies_fabricated_reads() {
        let opts = AdapterOptions::new().with_faked(OpKind::OpenObject);
        assert!(opts.fakes_object_read(ObjOpcode::Read));
    }

    #[test]
    fn faked_read_implies_fabricated_reads() {
        let opts = AdapterOptions::new().with_faked(OpKind::ReadObject);
        assert!(opts.fakes_object_read(ObjOpcode::Read));
    }

    #[test]
    fn fake_sync_follows_put_and_kv_service() {
        assert!(AdapterOptions::new()
            .with_faked(OpKind::PutKv)
            .fake_sync());
        assert!(AdapterOptions::new().with_fake_kv_service().fake_sync());
        assert!(!AdapterOptions::new()
            .with_faked(OpKind::GetKv)
            .fake_sync());
    }

    #[test]
    fn toml_roundtrip() {
        let opts = AdapterOptions::new()
            .with_faked(OpKind::CreateObject)
            .with_faked(OpKind::PutKv)
            .with_fake_kv_service();
        let toml = toml::to_string(&opts).unwrap();
        let back = AdapterOptions::from_toml_str(&toml).unwrap();
        assert_eq!(back, opts);
    }

    #[test]
    fn parse_from_toml() {
        let opts = AdapterOptions::from_toml_str(
            r#"
            faked = ["create_object", "put_kv"]
            fake_kv_service = true
            "#,
        )
        .unwrap();
        assert!(opts.is_faked(OpKind::CreateObject));
        assert!(opts.is_faked(OpKind::PutKv));
        assert!(opts.fake_kv_service);
    }

    #[test]
    fn missing_fields_default() {
        let opts = AdapterOptions::from_toml_str("").unwrap();
        assert_eq!(opts, AdapterOptions::default());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(AdapterOptions::from_toml_str("fake_everything = true").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "faked = [\"delete_kv\"]").unwrap();
        let opts = AdapterOptions::load(file.path()).unwrap();
        assert!(opts.is_faked(OpKind::DeleteKv));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = AdapterOptions::load(Path::new("/nonexistent/options.toml")).unwrap_err();
        assert!(matches!(err, crate::ConfigError::Io(_)));
    }
}
