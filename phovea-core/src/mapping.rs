//! Maps identifiers of one idtype to identifiers of another.

use std::collections::{BTreeMap, HashMap, HashSet};

/// A single source of `from -> to` identifier mappings.
pub trait IdMapper: Send + Sync {
    /// Mapped ids for every input id, in input order.
    fn map(&self, ids: &[String]) -> Vec<Vec<String>>;
}

impl<F> IdMapper for F
where
    F: Fn(&[String]) -> Vec<Vec<String>> + Send + Sync,
{
    fn map(&self, ids: &[String]) -> Vec<Vec<String>> {
        self(ids)
    }
}

/// Mapper backed by an in-memory lookup table.
#[derive(Debug, Clone, Default)]
pub struct TableMapper {
    table: HashMap<String, Vec<String>>,
}

impl TableMapper {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut table: HashMap<String, Vec<String>> = HashMap::new();
        for (from, to) in pairs {
            table.entry(from).or_default().push(to);
        }
        Self { table }
    }
}

impl IdMapper for TableMapper {
    fn map(&self, ids: &[String]) -> Vec<Vec<String>> {
        ids.iter()
            .map(|id| self.table.get(id).cloned().unwrap_or_default())
            .collect()
    }
}

/// Registry of mappers keyed by `(from idtype, to idtype)`.
#[derive(Default)]
pub struct MappingManager {
    mappers: BTreeMap<String, BTreeMap<String, Vec<Box<dyn IdMapper>>>>,
}

impl MappingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, from: &str, to: &str, mapper: impl IdMapper + 'static) {
        log::info!("registering id mapping {} -> {}", from, to);
        self.mappers
            .entry(from.to_string())
            .or_default()
            .entry(to.to_string())
            .or_default()
            .push(Box::new(mapper));
    }

    pub fn can_map(&self, from: &str, to: &str) -> bool {
        self.mappers
            .get(from)
            .is_some_and(|targets| targets.contains_key(to))
    }

    /// Idtypes `from` can be mapped to, sorted.
    pub fn maps_to(&self, from: &str) -> Vec<String> {
        self.mappers
            .get(from)
            .map(|targets| targets.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Map `ids` through every registered mapper for the pair.
    ///
    /// Results of several mappers are merged per id, keeping first-seen
    /// order and dropping duplicates.
    pub fn map(&self, from: &str, to: &str, ids: &[String]) -> Vec<Vec<String>> {
        let mappers = match self.mappers.get(from).and_then(|targets| targets.get(to)) {
            Some(mappers) if !mappers.is_empty() => mappers,
            _ => {
                log::warn!("cannot find mapping from {} to {}", from, to);
                return vec![Vec::new(); ids.len()];
            }
        };

        if let [mapper] = mappers.as_slice() {
            return mapper.map(ids);
        }

        let mut merged = vec![Vec::new(); ids.len()];
        let mut seen = vec![HashSet::new(); ids.len()];
        for mapper in mappers {
            let rows = mapper.map(ids).into_iter().zip(&mut merged).zip(&mut seen);
            for ((mapped, result), known) in rows {
                for id in mapped {
                    if known.insert(id.clone()) {
                        result.push(id);
                    }
                }
            }
        }
        merged
    }
}
