use crate::eflk_parser::{EflkParser, ParseOutput};
use crate::eflk_writer::EflkWriter;
use crate::err::{NameCollisionError, Result};
use crate::model::header::Header;
use crate::ordered_map::OrderedMap;

/// A decoded `eflk` file: a version and its headers, keyed by name in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Container {
    pub version: u32,
    headers: OrderedMap<Header>,
}

impl Container {
    pub fn new(version: u32) -> Self {
        Container {
            version,
            headers: OrderedMap::new(),
        }
    }

    pub(crate) fn from_parts(version: u32, headers: OrderedMap<Header>) -> Self {
        Container { version, headers }
    }

    pub fn headers(&self) -> &OrderedMap<Header> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers.get(name)
    }

    pub fn header_mut(&mut self, name: &str) -> Option<&mut Header> {
        self.headers.get_mut(name)
    }

    /// Inserts `header` under its own name. An existing header with that name is replaced in
    /// place, keeping its position, and the collision is returned.
    pub fn insert_header(&mut self, header: Header) -> Option<NameCollisionError> {
        let name = header.name().to_owned();

        self.headers
            .insert(name.clone(), header)
            .map(|_| NameCollisionError {
                scope: "container".to_owned(),
                name,
            })
    }

    /// Applies every header of `other` on top of this container, replacing headers that share a
    /// name. Headers only present in `other` are appended in its order.
    pub fn merge(&mut self, other: Container) -> Vec<NameCollisionError> {
        other
            .headers
            .into_iter()
            .filter_map(|(_, header)| self.insert_header(header))
            .collect()
    }

    /// Decodes with default settings. See [`EflkParser`] for configuration.
    pub fn from_bytes(data: &[u8]) -> Result<ParseOutput> {
        EflkParser::from_buffer(data.to_vec()).parse()
    }

    /// Encodes with default settings. See [`EflkWriter`] for configuration.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        EflkWriter::default().to_bytes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_replaces_by_name() {
        let mut base = Container::new(1);
        base.insert_header(Header::new("player"));
        base.insert_header(Header::new("enemy"));

        let mut edits = Container::new(1);
        edits.insert_header(Header::new("enemy"));
        edits.insert_header(Header::new("boss"));

        let collisions = base.merge(edits);

        assert_eq!(
            collisions,
            vec![NameCollisionError {
                scope: "container".to_owned(),
                name: "enemy".to_owned(),
            }]
        );
        assert_eq!(
            base.headers().keys().collect::<Vec<_>>(),
            vec!["player", "enemy", "boss"]
        );
    }
}
