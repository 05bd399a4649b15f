//! Services shared by request handlers.
//!
//! Built once at start-up and passed by reference, so there is no module
//! level registry to initialize in the right order.

use anyhow::Result;

use crate::assigner::{FileIdAssigner, IdAssigner, MemoryIdAssigner};
use crate::config::{AssignerKind, Config};
use crate::error::RangeError;
use crate::mapping::MappingManager;
use crate::range::Selection;

pub struct AppContext {
    config: Config,
    assigner: Box<dyn IdAssigner>,
    mappings: MappingManager,
}

impl AppContext {
    /// Create the context, picking the assigner the config asks for.
    pub fn from_config(config: Config) -> Result<Self> {
        let assigner: Box<dyn IdAssigner> = match config.assigner() {
            AssignerKind::Memory => Box::new(MemoryIdAssigner::new()),
            AssignerKind::File => {
                let data_dir = config.data_dir();
                log::debug!("Using file id assigner in {}", data_dir.display());
                Box::new(FileIdAssigner::new(data_dir))
            }
        };
        Ok(Self::with_assigner(config, assigner))
    }

    pub fn with_assigner(config: Config, assigner: Box<dyn IdAssigner>) -> Self {
        Self {
            config,
            assigner,
            mappings: MappingManager::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn assigner(&self) -> &dyn IdAssigner {
        self.assigner.as_ref()
    }

    pub fn mappings(&self) -> &MappingManager {
        &self.mappings
    }

    /// For registering mappers during start-up.
    pub fn mappings_mut(&mut self) -> &mut MappingManager {
        &mut self.mappings
    }

    /// Interpret the `range` request parameter.
    pub fn selection(&self, range: Option<&str>) -> std::result::Result<Selection, RangeError> {
        Selection::from_query(range)
    }
}
