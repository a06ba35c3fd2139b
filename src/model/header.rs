use crate::err::{NameCollisionError, RecordFamily, Warning};
use crate::model::group::{ActionGroup, RecordGroup, RecordRange, ResourceGroup};
use crate::model::parameter::ParameterRecord;
use crate::model::trigger::TriggerRecord;
use crate::ordered_map::OrderedMap;

/// A group together with copies of the records it owns. This is the shape groups have in the
/// text interchange form, and the shape edits are made in.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupContents<R> {
    pub key: String,
    pub name: String,
    pub records: Vec<R>,
}

/// The records of a family in the order they will be written, with each group's range
/// recomputed against that order.
#[derive(Debug)]
pub struct Flattened<'a, R> {
    pub records: Vec<&'a R>,
    pub ranges: Vec<RecordRange>,
}

/// One named effect set: two record arenas and the groups that partition them.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    name: String,
    parameters: Vec<ParameterRecord>,
    triggers: Vec<TriggerRecord>,
    resource_groups: OrderedMap<ResourceGroup>,
    action_groups: OrderedMap<ActionGroup>,
}

impl Header {
    pub fn new(name: impl Into<String>) -> Self {
        Header {
            name: name.into(),
            parameters: Vec::new(),
            triggers: Vec::new(),
            resource_groups: OrderedMap::new(),
            action_groups: OrderedMap::new(),
        }
    }

    /// Used by the decoder, which already holds the flat arrays and validated ranges.
    pub(crate) fn from_arenas(
        name: String,
        parameters: Vec<ParameterRecord>,
        triggers: Vec<TriggerRecord>,
        resource_groups: OrderedMap<ResourceGroup>,
        action_groups: OrderedMap<ActionGroup>,
    ) -> Self {
        Header {
            name,
            parameters,
            triggers,
            resource_groups,
            action_groups,
        }
    }

    /// Builds a header from groups that carry their own records. The arenas are laid out in
    /// group order, so the result always satisfies [`Header::validate`].
    ///
    /// When two groups share a key the later one wins, and the collision is returned.
    pub fn from_groups(
        name: impl Into<String>,
        resource_groups: Vec<GroupContents<ParameterRecord>>,
        action_groups: Vec<GroupContents<TriggerRecord>>,
    ) -> (Header, Vec<NameCollisionError>) {
        let name = name.into();
        let scope = format!("header `{}`", name);

        let (resource_groups, mut collisions) = dedup_groups(resource_groups, &scope);
        let (action_groups, action_collisions) = dedup_groups(action_groups, &scope);
        collisions.extend(action_collisions);

        let (parameters, resource_groups) = rebuild(resource_groups);
        let (triggers, action_groups) = rebuild(action_groups);

        let header = Header {
            name,
            parameters,
            triggers,
            resource_groups,
            action_groups,
        };

        (header, collisions)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flat parameter array, in on-disk order.
    pub fn parameters(&self) -> &[ParameterRecord] {
        &self.parameters
    }

    /// The flat trigger array, in on-disk order.
    pub fn triggers(&self) -> &[TriggerRecord] {
        &self.triggers
    }

    pub fn resource_groups(&self) -> &OrderedMap<ResourceGroup> {
        &self.resource_groups
    }

    pub fn action_groups(&self) -> &OrderedMap<ActionGroup> {
        &self.action_groups
    }

    /// Records owned by the resource group stored under `key`.
    pub fn resource_group_records(&self, key: &str) -> Option<&[ParameterRecord]> {
        self.resource_groups
            .get(key)
            .map(|group| records_of(&self.parameters, group))
    }

    /// Records owned by the action group stored under `key`.
    pub fn action_group_records(&self, key: &str) -> Option<&[TriggerRecord]> {
        self.action_groups
            .get(key)
            .map(|group| records_of(&self.triggers, group))
    }

    pub fn resource_group_contents(&self) -> Vec<GroupContents<ParameterRecord>> {
        contents(&self.parameters, &self.resource_groups)
    }

    pub fn action_group_contents(&self) -> Vec<GroupContents<TriggerRecord>> {
        contents(&self.triggers, &self.action_groups)
    }

    /// Inserts or replaces the resource group under `key`, then lays the parameter arena out
    /// again in group order.
    pub fn insert_resource_group(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        records: Vec<ParameterRecord>,
    ) -> Option<NameCollisionError> {
        let scope = format!("header `{}`", self.name);
        let mut groups = self.resource_group_contents();
        let collision = replace_or_push(
            &mut groups,
            GroupContents {
                key: key.into(),
                name: name.into(),
                records,
            },
            &scope,
        );

        let (parameters, resource_groups) = rebuild(groups);
        self.parameters = parameters;
        self.resource_groups = resource_groups;

        collision
    }

    /// Inserts or replaces the action group under `key`, then lays the trigger arena out again
    /// in group order.
    pub fn insert_action_group(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        records: Vec<TriggerRecord>,
    ) -> Option<NameCollisionError> {
        let scope = format!("header `{}`", self.name);
        let mut groups = self.action_group_contents();
        let collision = replace_or_push(
            &mut groups,
            GroupContents {
                key: key.into(),
                name: name.into(),
                records,
            },
            &scope,
        );

        let (triggers, action_groups) = rebuild(groups);
        self.triggers = triggers;
        self.action_groups = action_groups;

        collision
    }

    pub fn flattened_parameters(&self) -> Flattened<'_, ParameterRecord> {
        flatten(&self.parameters, &self.resource_groups)
    }

    pub fn flattened_triggers(&self) -> Flattened<'_, TriggerRecord> {
        flatten(&self.triggers, &self.action_groups)
    }

    /// Checks that, for both families, the groups taken in order tile the arena exactly.
    ///
    /// Headers built through this API always pass, and the decoder reports every failure as a
    /// warning. A header that fails will still encode, but the flat arrays are rebuilt from
    /// group order: records no group owns are dropped and the written ranges differ from the
    /// decoded ones.
    pub fn validate(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();

        if let Some(w) = check_layout(&self.name, self.parameters.len(), &self.resource_groups) {
            warnings.push(w);
        }
        if let Some(w) = check_layout(&self.name, self.triggers.len(), &self.action_groups) {
            warnings.push(w);
        }

        warnings
    }
}

fn records_of<'a, R, G: RecordGroup>(arena: &'a [R], group: &G) -> &'a [R] {
    arena.get(group.range().as_range()).unwrap_or(&[])
}

fn contents<R: Clone, G: RecordGroup>(
    arena: &[R],
    groups: &OrderedMap<G>,
) -> Vec<GroupContents<R>> {
    groups
        .iter()
        .map(|(key, group)| GroupContents {
            key: key.to_owned(),
            name: group.name().to_owned(),
            records: records_of(arena, group).to_vec(),
        })
        .collect()
}

fn replace_or_push<R>(
    groups: &mut Vec<GroupContents<R>>,
    group: GroupContents<R>,
    scope: &str,
) -> Option<NameCollisionError> {
    match groups.iter_mut().find(|existing| existing.key == group.key) {
        Some(existing) => {
            let collision = NameCollisionError {
                scope: scope.to_owned(),
                name: group.key.clone(),
            };
            *existing = group;
            Some(collision)
        }
        None => {
            groups.push(group);
            None
        }
    }
}

fn dedup_groups<R>(
    groups: Vec<GroupContents<R>>,
    scope: &str,
) -> (Vec<GroupContents<R>>, Vec<NameCollisionError>) {
    let (map, collisions) = OrderedMap::from_entries(
        groups.into_iter().map(|g| (g.key, (g.name, g.records))),
        scope,
    );

    let groups = map
        .into_iter()
        .map(|(key, (name, records))| GroupContents { key, name, records })
        .collect();

    (groups, collisions)
}

/// Concatenates the groups' records into a fresh arena and gives each group its slice of it.
fn rebuild<R, G: RecordGroup>(groups: Vec<GroupContents<R>>) -> (Vec<R>, OrderedMap<G>) {
    let mut arena = Vec::new();
    let mut map = OrderedMap::new();

    for group in groups {
        let range = RecordRange::new(arena.len(), group.records.len());
        arena.extend(group.records);
        map.insert(group.key, G::from_parts(group.name, range));
    }

    (arena, map)
}

fn flatten<'a, R, G: RecordGroup>(arena: &'a [R], groups: &OrderedMap<G>) -> Flattened<'a, R> {
    let mut records = Vec::with_capacity(arena.len());
    let mut ranges = Vec::with_capacity(groups.len());

    for group in groups.values() {
        let owned = records_of(arena, group);
        ranges.push(RecordRange::new(records.len(), owned.len()));
        records.extend(owned.iter());
    }

    Flattened { records, ranges }
}

fn check_layout<G: RecordGroup>(
    header: &str,
    available: usize,
    groups: &OrderedMap<G>,
) -> Option<Warning> {
    let layout_warning = |detail: String| Warning::GroupLayout {
        header: header.to_owned(),
        family: G::FAMILY,
        detail,
    };

    let mut cursor = 0;
    for (key, group) in groups.iter() {
        let range = group.range();
        if range.is_empty() {
            continue;
        }
        if range.start() != cursor {
            return Some(layout_warning(format!(
                "group `{}` starts at {} but the groups before it end at {}",
                key,
                range.start(),
                cursor
            )));
        }
        cursor = range.end();
    }

    if cursor < available {
        return Some(layout_warning(format!(
            "{} of {} records are not owned by any group",
            available - cursor,
            available
        )));
    }
    if cursor > available {
        return Some(layout_warning(format!(
            "groups reach record {} but only {} exist",
            cursor, available
        )));
    }

    None
}
