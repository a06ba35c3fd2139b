//! JSON form of a container.
//!
//! Records are nested inside the group that owns them, so the flat arrays and ranges of the
//! binary form never appear in the document. Importing rebuilds them from the nesting.

use std::fmt;
use std::marker::PhantomData;

use log::warn;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::err::{Result, Warning};
use crate::model::{Container, GroupContents, Header, ParameterRecord, TriggerRecord};
use crate::ordered_map::OrderedMap;

/// A JSON object read as a list of entries, so that repeated keys can still be seen.
#[derive(Debug, Clone, PartialEq)]
struct Entries<V>(Vec<(String, V)>);

impl<V> Default for Entries<V> {
    fn default() -> Self {
        Entries(Vec::new())
    }
}

impl<V: Serialize> Serialize for Entries<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct EntriesVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
    type Value = Entries<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut access: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(entry) = access.next_entry::<String, V>()? {
            entries.push(entry);
        }
        Ok(Entries(entries))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ContainerDocument {
    version: u32,
    #[serde(default)]
    headers: Entries<HeaderDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HeaderDocument {
    #[serde(default)]
    resource_groups: Entries<ResourceGroupDocument>,
    #[serde(default)]
    action_groups: Entries<ActionGroupDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResourceGroupDocument {
    name: String,
    #[serde(default)]
    parameters: Vec<ParameterRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ActionGroupDocument {
    name: String,
    #[serde(default)]
    triggers: Vec<TriggerRecord>,
}

impl HeaderDocument {
    fn from_header(header: &Header) -> Self {
        for warning in header.validate() {
            warn!("{}, records outside of groups are not exported", warning);
        }

        let resource_groups = header
            .resource_group_contents()
            .into_iter()
            .map(|group| {
                let document = ResourceGroupDocument {
                    name: group.name,
                    parameters: group.records,
                };
                (group.key, document)
            })
            .collect();

        let action_groups = header
            .action_group_contents()
            .into_iter()
            .map(|group| {
                let document = ActionGroupDocument {
                    name: group.name,
                    triggers: group.records,
                };
                (group.key, document)
            })
            .collect();

        HeaderDocument {
            resource_groups: Entries(resource_groups),
            action_groups: Entries(action_groups),
        }
    }

    fn into_header(self, name: String) -> (Header, Vec<Warning>) {
        let resource_groups = self
            .resource_groups
            .0
            .into_iter()
            .map(|(key, group)| GroupContents {
                key,
                name: group.name,
                records: group.parameters,
            })
            .collect();

        let action_groups = self
            .action_groups
            .0
            .into_iter()
            .map(|(key, group)| GroupContents {
                key,
                name: group.name,
                records: group.triggers,
            })
            .collect();

        let (header, collisions) = Header::from_groups(name, resource_groups, action_groups);
        (header, collisions.into_iter().map(Warning::from).collect())
    }
}

/// Renders `container` as JSON, with records nested under their groups.
pub fn to_json_string(container: &Container, pretty: bool) -> Result<String> {
    let document = ContainerDocument {
        version: container.version,
        headers: Entries(
            container
                .headers()
                .iter()
                .map(|(name, header)| (name.to_owned(), HeaderDocument::from_header(header)))
                .collect(),
        ),
    };

    let json = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };

    Ok(json)
}

/// Builds a container from its JSON form.
///
/// Repeated header or group keys are not an error. The last definition wins and each collision
/// is returned as a warning.
pub fn from_json_str(json: &str) -> Result<(Container, Vec<Warning>)> {
    let document: ContainerDocument = serde_json::from_str(json)?;
    let mut warnings = Vec::new();

    let mut headers = Vec::with_capacity(document.headers.0.len());

    for (name, header_document) in document.headers.0 {
        let (header, header_warnings) = header_document.into_header(name.clone());
        warnings.extend(header_warnings);
        headers.push((name, header));
    }

    let (headers, collisions) = OrderedMap::from_entries(headers, "container");
    warnings.extend(collisions.into_iter().map(Warning::from));

    for warning in &warnings {
        warn!("{}", warning);
    }

    Ok((Container::from_parts(document.version, headers), warnings))
}
