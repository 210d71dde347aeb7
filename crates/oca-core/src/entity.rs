use std::fmt;
use std::marker::PhantomData;

use oca_xml::{AttributeView, Field, Template, XmlElement};
use tracing::{debug, warn};

use crate::{Arg, Kind, OcaError, Transport};

/// One remote resource of kind `K`, addressed by its integer id.
///
/// The transport is borrowed; every entity of a pool shares the same one.
pub struct Entity<'c, K: Kind> {
    transport: &'c dyn Transport,
    view: AttributeView,
    id: i64,
    kind: PhantomData<K>,
}

impl<'c, K: Kind> Entity<'c, K> {
    /// Build an entity from an already fetched element.
    pub fn from_element(
        transport: &'c dyn Transport,
        element: XmlElement,
    ) -> Result<Self, OcaError> {
        if !element.has_tag(K::ELEMENT_NAME) {
            return Err(oca_xml::XmlError::InvalidRoot {
                expected: K::ELEMENT_NAME.to_string(),
                found: element.tag().to_string(),
            }
            .into());
        }
        let view = AttributeView::new(element, K::SCHEMA)?;
        Self::from_view(transport, view)
    }

    /// Entity holding only `id`; nothing is fetched until [`Entity::refresh`].
    pub fn new_with_id(transport: &'c dyn Transport, id: i64) -> Result<Self, OcaError> {
        let element = XmlElement::new(K::ELEMENT_NAME)
            .with_child(XmlElement::new("ID").with_text(id.to_string()));
        Self::from_element(transport, element)
    }

    fn from_view(transport: &'c dyn Transport, view: AttributeView) -> Result<Self, OcaError> {
        let id = view.get_int("id")?;
        Ok(Self {
            transport,
            view,
            id,
            kind: PhantomData,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Value of the `name` field.
    pub fn name(&self) -> Result<&str, OcaError> {
        Ok(self.view.get_str("name")?)
    }

    /// Field lookup: declared values first, then child elements.
    pub fn get(&self, name: &str) -> Result<Field<'_>, OcaError> {
        Ok(self.view.get(name)?)
    }

    pub fn get_int(&self, name: &str) -> Result<i64, OcaError> {
        Ok(self.view.get_int(name)?)
    }

    pub fn get_str(&self, name: &str) -> Result<&str, OcaError> {
        Ok(self.view.get_str(name)?)
    }

    pub fn template(&self, name: &str) -> Result<&Template, OcaError> {
        Ok(self.view.template(name)?)
    }

    pub fn view(&self) -> &AttributeView {
        &self.view
    }

    pub fn transport(&self) -> &'c dyn Transport {
        self.transport
    }

    /// Re-fetch this entity by id and replace its fields.
    ///
    /// On any error the current fields are kept.
    pub fn refresh(&mut self) -> Result<(), OcaError> {
        debug!(method = K::INFO_METHOD, id = self.id, "refresh entity");
        let xml = self.transport.call(K::INFO_METHOD, &[Arg::Int(self.id)])?;
        let view = AttributeView::initialize_from(&xml, K::ELEMENT_NAME, K::SCHEMA).map_err(
            |err| {
                warn!(kind = K::ELEMENT_NAME, id = self.id, error = %err, "rejected entity response");
                err
            },
        )?;
        let refreshed = Self::from_view(self.transport, view)?;
        self.view = refreshed.view;
        self.id = refreshed.id;
        Ok(())
    }

    /// Delete the remote resource. Removing it from a pool is up to the caller.
    pub fn delete(&self) -> Result<(), OcaError> {
        debug!(method = K::DELETE_METHOD, id = self.id, "delete entity");
        self.transport.call(K::DELETE_METHOD, &[Arg::Int(self.id)])?;
        Ok(())
    }
}

impl<K: Kind> fmt::Debug for Entity<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &K::ELEMENT_NAME)
            .field("id", &self.id)
            .field("view", &self.view)
            .finish()
    }
}
