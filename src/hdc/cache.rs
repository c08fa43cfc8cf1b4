//! Symbol vector caches
//!
//! Generation is a pure function, so caching is only an optimisation:
//! concurrent first lookups of the same symbol may both generate, and the
//! first insert wins. Every later lookup returns that stored instance.

use super::generator::{self, Namespace};
use super::vector::{check_dim, Hypervector, TieBreak};
use crate::error::{HdcError, HdcResult};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Outcome of [`SymbolCache::preload`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadStats {
    /// Entries added to the cache
    pub inserted: usize,
    /// Added entries that differ from what the generator produces
    pub differing: usize,
}

/// Thread-safe, append-only cache for one symbol namespace
pub struct SymbolCache {
    namespace: Namespace,
    dim: usize,
    entries: DashMap<String, Arc<Hypervector>>,
}

impl SymbolCache {
    pub fn new(namespace: Namespace, dim: usize) -> HdcResult<Self> {
        if dim == 0 {
            return Err(HdcError::InvalidDimension(dim));
        }
        Ok(Self {
            namespace,
            dim,
            entries: DashMap::new(),
        })
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Get a symbol's vector (cached)
    pub fn get_or_create(&self, symbol: &str) -> HdcResult<Arc<Hypervector>> {
        // Check cache first
        if let Some(hv) = self.entries.get(symbol) {
            return Ok(Arc::clone(&hv));
        }

        // Generate outside the shard lock, keep whichever insert landed first
        let generated = Arc::new(generator::generate(self.namespace, symbol, self.dim)?);
        let stored = self
            .entries
            .entry(symbol.to_string())
            .or_insert(generated);
        Ok(Arc::clone(&stored))
    }

    /// Seed the cache from a precomputed table.
    ///
    /// Entries already present are kept unchanged. A table entry that does
    /// not match the generator is still used, but counted and logged: it
    /// makes encodings disagree with any run that did not load the table.
    pub fn preload(&self, table: BTreeMap<String, Hypervector>) -> HdcResult<PreloadStats> {
        let mut stats = PreloadStats::default();
        for (symbol, hv) in table {
            check_dim(self.dim, hv.dim())?;
            if self.entries.contains_key(&symbol) {
                continue;
            }
            if hv != generator::generate(self.namespace, &symbol, self.dim)? {
                stats.differing += 1;
            }
            self.entries.entry(symbol).or_insert_with(|| {
                stats.inserted += 1;
                Arc::new(hv)
            });
        }
        if stats.differing > 0 {
            warn!(
                "{} preloaded {:?} vectors differ from generated ones",
                stats.differing, self.namespace
            );
        }
        Ok(stats)
    }

    /// Snapshot of every cached symbol, sorted
    pub fn snapshot(&self) -> BTreeMap<String, Arc<Hypervector>> {
        self.entries
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything needed to encode at one dimension: the two symbol caches and
/// the shared tie-break vector.
///
/// Owned by the caller and passed by reference; a run creates exactly one
/// and hands it to every encoder and class builder.
pub struct Codebook {
    dim: usize,
    tie_break: TieBreak,
    opcodes: SymbolCache,
    methods: SymbolCache,
}

impl Codebook {
    pub fn new(dim: usize) -> HdcResult<Self> {
        Ok(Self {
            dim,
            tie_break: generator::tie_break(dim)?,
            opcodes: SymbolCache::new(Namespace::Opcode, dim)?,
            methods: SymbolCache::new(Namespace::Method, dim)?,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn tie_break(&self) -> &TieBreak {
        &self.tie_break
    }

    pub fn opcode(&self, op: &str) -> HdcResult<Arc<Hypervector>> {
        self.opcodes.get_or_create(op)
    }

    pub fn method(&self, method: &str) -> HdcResult<Arc<Hypervector>> {
        self.methods.get_or_create(method)
    }

    pub fn opcodes(&self) -> &SymbolCache {
        &self.opcodes
    }

    pub fn methods(&self) -> &SymbolCache {
        &self.methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_repeated_lookup_returns_same_instance() {
        let cache = SymbolCache::new(Namespace::Opcode, 128).unwrap();
        let a = cache.get_or_create("return-void").unwrap();
        let b = cache.get_or_create("return-void").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cached_value_matches_generator() {
        let cache = SymbolCache::new(Namespace::Method, 256).unwrap();
        let cached = cache.get_or_create("La;->b").unwrap();
        let fresh = generator::generate(Namespace::Method, "La;->b", 256).unwrap();
        assert_eq!(*cached, fresh);
    }

    #[test]
    fn test_concurrent_inserts_agree() {
        let cache = SymbolCache::new(Namespace::Opcode, 64).unwrap();
        let symbols: Vec<String> = (0..200).map(|i| format!("op{}", i % 20)).collect();
        let vectors: Vec<_> = symbols
            .par_iter()
            .map(|s| cache.get_or_create(s).unwrap())
            .collect();
        assert_eq!(cache.len(), 20);
        for (s, v) in symbols.iter().zip(&vectors) {
            assert_eq!(**v, *cache.get_or_create(s).unwrap());
        }
    }

    #[test]
    fn test_preload_keeps_existing_entries() {
        let cache = SymbolCache::new(Namespace::Opcode, 8).unwrap();
        let existing = cache.get_or_create("nop").unwrap();

        let mut table = BTreeMap::new();
        table.insert("nop".to_string(), Hypervector::ones(8).unwrap());
        table.insert("goto".to_string(), Hypervector::ones(8).unwrap());
        assert_eq!(cache.preload(table).unwrap().inserted, 1);
        assert!(Arc::ptr_eq(&existing, &cache.get_or_create("nop").unwrap()));
        assert_eq!(*cache.get_or_create("goto").unwrap(), Hypervector::ones(8).unwrap());
    }

    #[test]
    fn test_preload_counts_foreign_vectors() {
        let cache = SymbolCache::new(Namespace::Method, 64).unwrap();
        let mut table = BTreeMap::new();
        table.insert(
            "La;->own".to_string(),
            generator::generate(Namespace::Method, "La;->own", 64).unwrap(),
        );
        // Generated in the other namespace, so it cannot match
        table.insert(
            "La;->foreign".to_string(),
            generator::generate(Namespace::Opcode, "La;->foreign", 64).unwrap(),
        );
        let stats = cache.preload(table).unwrap();
        assert_eq!(stats, PreloadStats { inserted: 2, differing: 1 });
    }

    #[test]
    fn test_preload_rejects_wrong_dimension() {
        let cache = SymbolCache::new(Namespace::Opcode, 8).unwrap();
        let mut table = BTreeMap::new();
        table.insert("nop".to_string(), Hypervector::ones(4).unwrap());
        assert!(matches!(
            cache.preload(table),
            Err(HdcError::DimensionMismatch { expected: 8, found: 4 })
        ));
    }

    #[test]
    fn test_codebook_shares_dimension() {
        let book = Codebook::new(32).unwrap();
        assert_eq!(book.opcode("nop").unwrap().dim(), 32);
        assert_eq!(book.method("La;->b").unwrap().dim(), 32);
        assert_eq!(book.tie_break().dim(), 32);
    }
}
