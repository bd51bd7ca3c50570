//! Task-node struct layouts, one row per schema.
//!
//! This table is the only place that needs to change to support another
//! game build.

/// Struct layout family shared by one or more builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    Sly2,
    Sly3,
}

/// Logical task-node fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    State,
    NumChildren,
    ChildrenArray,
    NumParents,
    ParentsArray,
    Job,
    Checkpoint,
}

/// Byte offset of `field` inside a task node for `schema`.
pub const fn offset_for(schema: Schema, field: Field) -> u32 {
    match (schema, field) {
        (_, Field::Id) => 0x18,
        (Schema::Sly2, Field::State) => 0x54,
        (Schema::Sly3, Field::State) => 0x44,
        (Schema::Sly2, Field::NumChildren) => 0xa0,
        (Schema::Sly3, Field::NumChildren) => 0x90,
        (Schema::Sly2, Field::ChildrenArray) => 0xa4,
        (Schema::Sly3, Field::ChildrenArray) => 0x94,
        (Schema::Sly2, Field::NumParents) => 0x94,
        (Schema::Sly3, Field::NumParents) => 0x84,
        (Schema::Sly2, Field::ParentsArray) => 0x98,
        (Schema::Sly3, Field::ParentsArray) => 0x88,
        (Schema::Sly2, Field::Job) => 0x7c,
        (Schema::Sly3, Field::Job) => 0x6c,
        (Schema::Sly2, Field::Checkpoint) => 0xb8,
        (Schema::Sly3, Field::Checkpoint) => 0xa8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sly3_fields_sit_sixteen_bytes_earlier_except_id() {
        let fields = [
            Field::State,
            Field::NumChildren,
            Field::ChildrenArray,
            Field::NumParents,
            Field::ParentsArray,
            Field::Job,
            Field::Checkpoint,
        ];
        for field in fields {
            assert_eq!(
                offset_for(Schema::Sly2, field) - offset_for(Schema::Sly3, field),
                0x10,
                "{:?}",
                field
            );
        }
        assert_eq!(offset_for(Schema::Sly2, Field::Id), offset_for(Schema::Sly3, Field::Id));
    }
}
