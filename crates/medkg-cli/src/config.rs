//! Layered configuration for the `medkg` binary.
//!
//! Sources, later ones overriding earlier ones: built-in defaults, `<config dir>/medkg/config.toml`,
//! the file passed with `--config`, then `MEDKG_`-prefixed environment variables with `__`
//! between sections (`MEDKG_LLM__MODEL=llama3`). Variables from `.env` count as environment
//! once [`crate::load_dotenv`] has run.
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use color_eyre::eyre::{Result, WrapErr};
use medkg_db::{Database, Engine, DEFAULT_EF};
use medkg_embed::{
    config::{HuggingFaceConfig, LocalModelConfig},
    local::LocalEmbedder,
    providers::hugging_face::HuggingFaceBackend,
    EmbeddingProcessor, EmbeddingSource,
};
use medkg_llm::LlmConfig;
use medkg_rag::{RagConfig, RetrievalConfig, TimeoutConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MedkgConfig {
    pub db: DbConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// `mem`, `sqlite` or `rocksdb`.
    pub engine: String,
    /// Store location for the persistent engines.
    pub path: PathBuf,
    /// Cozo backup restored into a fresh in-memory store. Only used with the `mem` engine.
    pub backup: Option<PathBuf>,
    /// Create missing relations and the vector index on startup.
    pub init_schema: bool,
    /// HNSW search breadth.
    pub ef: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Mem.as_str().to_string(),
            path: PathBuf::from("medkg.db"),
            backup: None,
            init_schema: false,
            ef: DEFAULT_EF,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    #[default]
    Local,
    HuggingFace,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub local: LocalModelConfig,
    pub hugging_face: HuggingFaceConfig,
}

impl MedkgConfig {
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(dir) = dirs::config_dir() {
            builder = builder.add_source(
                config::File::from(dir.join("medkg").join("config.toml")).required(false),
            );
        }
        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("MEDKG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .wrap_err("failed to read configuration")?
            .try_deserialize::<MedkgConfig>()
            .wrap_err("invalid configuration")?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    pub fn rag(&self) -> RagConfig {
        RagConfig {
            retrieval: self.retrieval,
            timeouts: self.timeouts,
        }
    }

    /// Load the configured embedding model. Local models are fetched from the hub on first use.
    pub async fn load_embedder(&self) -> Result<Arc<EmbeddingProcessor>> {
        let source = match self.embedding.provider {
            EmbeddingProvider::Local => {
                let local = self.embedding.local.clone();
                let embedder = tokio::task::spawn_blocking(move || LocalEmbedder::new(&local))
                    .await
                    .wrap_err("embedding model loader panicked")?
                    .wrap_err("failed to load local embedding model")?;
                EmbeddingSource::Local(embedder)
            }
            EmbeddingProvider::HuggingFace => {
                EmbeddingSource::HuggingFace(HuggingFaceBackend::new(&self.embedding.hugging_face))
            }
        };
        let processor = EmbeddingProcessor::new(source);
        tracing::info!(
            provider = ?self.embedding.provider,
            dimensions = processor.dimensions(),
            "embedder ready"
        );
        Ok(Arc::new(processor))
    }

    /// Open the graph store, restoring a backup or creating the schema when asked to.
    pub fn open_db(&self, dims: usize) -> Result<Arc<Database>> {
        let cfg = &self.db;
        let engine: Engine = cfg.engine.parse()?;
        let db = match (engine, &cfg.backup) {
            (Engine::Mem, Some(backup)) => {
                let db = Database::init_mem()?;
                db.restore_backup(backup)
                    .wrap_err_with(|| format!("restoring {}", backup.display()))?;
                db
            }
            (Engine::Mem, None) => Database::init_mem()?,
            (engine, _) => Database::open(engine, &cfg.path)?,
        };
        if cfg.init_schema {
            db.init_schema(dims)?;
        }
        Ok(Arc::new(db.with_ef(cfg.ef)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use medkg_llm::LlmBackend;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MedkgConfig::default();
        assert_eq!(config.db.engine, "mem");
        assert_eq!(config.db.ef, DEFAULT_EF);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Local);
        assert_eq!(config.llm.model, "CustomLlama3:latest");
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.timeouts.translate_secs, 45);
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[db]
engine = "sqlite"
path = "/tmp/graph.db"

[llm]
backend = "http"
model = "llama3"

[retrieval]
top_k = 25

[timeouts]
generate_secs = 90
"#
        )
        .unwrap();

        let config = MedkgConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.db.engine, "sqlite");
        assert_eq!(config.db.path, PathBuf::from("/tmp/graph.db"));
        assert_eq!(config.llm.backend, LlmBackend::Http);
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.retrieval.top_k, 25);
        // untouched keys keep their defaults
        assert_eq!(config.retrieval.context_n, 2);
        assert_eq!(config.rag().timeouts.generate_secs, 90);
        assert_eq!(config.rag().timeouts.embed_secs, 30);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(MedkgConfig::load(Some(Path::new("/nonexistent/medkg.toml"))).is_err());
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let mut config = MedkgConfig::default();
        config.db.engine = "postgres".into();
        assert!(config.open_db(4).is_err());
    }

    #[test]
    fn mem_store_gets_schema_on_request() {
        let mut config = MedkgConfig::default();
        config.db.init_schema = true;
        let db = config.open_db(4).unwrap();
        let relations = db.relations_vec().unwrap();
        assert!(relations.iter().any(|r| r == "node"));
        assert!(relations.iter().any(|r| r == "relation"));
    }
}
