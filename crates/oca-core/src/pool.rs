use std::ops::Index;

use oca_xml::AttributeView;
use tracing::{debug, warn};

use crate::{Arg, Entity, Kind, OcaError, Transport};

/// Ordered collection of all entities of kind `K` known to the server.
///
/// Contents mirror the document order of the last successful
/// [`Pool::refresh`]; nothing is sorted or deduplicated.
pub struct Pool<'c, K: Kind> {
    transport: &'c dyn Transport,
    entries: Vec<Entity<'c, K>>,
}

impl<'c, K: Kind> Pool<'c, K> {
    /// Create an empty pool; call [`Pool::refresh`] to populate it.
    pub fn new(transport: &'c dyn Transport) -> Self {
        Self {
            transport,
            entries: Vec::new(),
        }
    }

    /// Root tag expected from the listing call.
    pub fn pool_name(&self) -> &'static str {
        K::POOL_NAME
    }

    /// Root tag of every listed element.
    pub fn element_name(&self) -> &'static str {
        K::ELEMENT_NAME
    }

    /// Fetch the full listing and replace the contents.
    ///
    /// `args` are forwarded to the listing method unmodified. The previous
    /// contents are kept unless every listed element parses.
    pub fn refresh(&mut self, args: &[Arg]) -> Result<(), OcaError> {
        debug!(method = K::POOL_INFO_METHOD, args = args.len(), "refresh pool");
        let xml = self.transport.call(K::POOL_INFO_METHOD, args)?;
        let entries = self.parse_listing(&xml).map_err(|err| {
            warn!(pool = K::POOL_NAME, error = %err, "rejected pool response");
            err
        })?;
        debug!(pool = K::POOL_NAME, count = entries.len(), "pool refreshed");
        self.entries = entries;
        Ok(())
    }

    fn parse_listing(&self, xml: &str) -> Result<Vec<Entity<'c, K>>, OcaError> {
        let listing = AttributeView::initialize_from(xml, K::POOL_NAME, &[])?;
        listing
            .into_element()
            .into_children()
            .into_iter()
            .map(|child| K::factory(self.transport, child))
            .collect()
    }

    /// First entity whose id equals `id`.
    pub fn find_by_id(&self, id: i64) -> Result<&Entity<'c, K>, OcaError> {
        self.entries
            .iter()
            .find(|entity| entity.id() == id)
            .ok_or(OcaError::UnknownId(id))
    }

    /// First entity whose `name` field equals `name`.
    pub fn find_by_name(&self, name: &str) -> Result<&Entity<'c, K>, OcaError> {
        self.entries
            .iter()
            .find(|entity| matches!(entity.name(), Ok(found) if found == name))
            .ok_or_else(|| OcaError::UnknownName(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entity<'c, K>> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity<'c, K>> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Entity<'c, K>] {
        &self.entries
    }

    /// Take ownership of the entities, leaving the pool empty.
    pub fn take(&mut self) -> Vec<Entity<'c, K>> {
        std::mem::take(&mut self.entries)
    }
}

impl<'c, K: Kind> Index<usize> for Pool<'c, K> {
    type Output = Entity<'c, K>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

impl<'a, 'c, K: Kind> IntoIterator for &'a Pool<'c, K> {
    type Item = &'a Entity<'c, K>;
    type IntoIter = std::slice::Iter<'a, Entity<'c, K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Kind> std::fmt::Debug for Pool<'_, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("pool", &K::POOL_NAME)
            .field("entries", &self.entries)
            .finish()
    }
}
