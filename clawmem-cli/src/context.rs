//! Shared setup every subcommand needs: runtime config, the index config
//! (collection list), and open handles to the store and gateway.

use std::path::PathBuf;

use clawmem_core::config::{IndexConfig, RuntimeConfig};
use clawmem_core::Result;
use clawmem_llm::{Gateway, GatewayConfig};
use clawmem_store::Store;

pub struct AppContext {
    pub store: Store,
    pub gateway: Gateway,
    pub index_config: IndexConfig,
    pub runtime_config: RuntimeConfig,
}

impl AppContext {
    pub async fn open(config_path: Option<&PathBuf>, index_path_override: Option<&PathBuf>) -> Result<Self> {
        let mut runtime_config = RuntimeConfig::from_env();
        if let Some(path) = index_path_override {
            runtime_config.index_path = Some(path.clone());
        }
        let index_config = IndexConfig::load(config_path.map(PathBuf::as_path))?;

        let store = Store::open(&runtime_config.resolve_db_path()).await?;
        let gateway = Gateway::new(GatewayConfig {
            embed_url: runtime_config.embed_url.clone(),
            llm_url: runtime_config.llm_url.clone(),
            rerank_url: runtime_config.rerank_url.clone(),
            ..GatewayConfig::default()
        });

        Ok(AppContext { store, gateway, index_config, runtime_config })
    }
}
