//! Shared entity fixtures for unit and integration tests.
//!
//! Not part of the public API; exported (hidden) so the integration suite
//! can reuse the same declarations as the inline module tests.

use crate::error::Error;
use crate::schema::{
    constructor, getter, EntityDeclaration, EntityRef, PropertyDef, PropertyType, RelationDef,
    ScalarType,
};
use crate::EntityType;
use relata_model::{PropertyMap, Value};
use std::sync::Arc;

/// Pet availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetStatus {
    Available,
    Pending,
    Sold,
}

impl PetStatus {
    /// Canonical variant names, as declared in the schema.
    pub const VARIANTS: [&'static str; 3] = ["Available", "Pending", "Sold"];

    pub fn parse(text: &str) -> Result<Self, String> {
        match text.to_ascii_lowercase().as_str() {
            "available" => Ok(PetStatus::Available),
            "pending" => Ok(PetStatus::Pending),
            "sold" => Ok(PetStatus::Sold),
            other => Err(format!("unknown pet status `{other}`")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PetStatus::Available => "Available",
            PetStatus::Pending => "Pending",
            PetStatus::Sold => "Sold",
        }
    }
}

fn status_type() -> PropertyType {
    PropertyType::enum_type(
        "PetStatus",
        PetStatus::VARIANTS.iter().map(|v| v.to_string()).collect(),
    )
}

/// An author with a collection of pets (one-to-many once inferred).
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    /// Populated by the storage adapter, never by the engine.
    pub pets: Vec<i64>,
}

impl EntityType for Author {
    const NAME: &'static str = "Author";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::record("Author")
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(PropertyDef::new(
                "first_name",
                PropertyType::scalar(ScalarType::String),
            ))
            .with_property(
                PropertyDef::new("pets", PropertyType::entity_collection("Pet"))
                    .with_relation(RelationDef::via(EntityRef::of::<Pet>(), "id", "owner")),
            )
            .constructed_by(constructor(|args| {
                let id = args.next_i64()?;
                let first_name = args.next_string()?;
                args.skip()?; // pets placeholder
                Ok(Author {
                    id,
                    first_name,
                    pets: Vec::new(),
                })
            }))
            .with_accessor("id", getter(|a: &Author| Value::Int64(a.id)))
            .with_accessor(
                "first_name",
                getter(|a: &Author| Value::String(a.first_name.clone())),
            )
            .with_accessor("pets", getter(|_: &Author| Value::empty_collection()))
    }
}

/// A pet with a reverse relation to its owning [`Author`].
#[derive(Debug, Clone, PartialEq)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    pub status: PetStatus,
    pub owner_id: i64,
}

impl EntityType for Pet {
    const NAME: &'static str = "Pet";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::record("Pet")
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(PropertyDef::new(
                "name",
                PropertyType::scalar(ScalarType::String),
            ))
            .with_property(PropertyDef::new("status", status_type()))
            .with_property(
                PropertyDef::new("owner_id", PropertyType::scalar(ScalarType::Int64))
                    .stored_as("owner")
                    .with_relation(RelationDef::via(EntityRef::of::<Author>(), "owner", "id")),
            )
            .constructed_by(constructor(|args| {
                let id = args.next_i64()?;
                let name = args.next_string()?;
                let status = PetStatus::parse(&args.next_string()?).map_err(|reason| {
                    Error::Constructor {
                        entity: "Pet".to_string(),
                        reason,
                    }
                })?;
                args.skip()?; // owner placeholder; the adapter sets it
                Ok(Pet {
                    id,
                    name,
                    status,
                    owner_id: 0,
                })
            }))
            .with_accessor("id", getter(|p: &Pet| Value::Int64(p.id)))
            .with_accessor("name", getter(|p: &Pet| Value::String(p.name.clone())))
            .with_accessor(
                "status",
                getter(|p: &Pet| Value::String(p.status.as_str().to_string())),
            )
            .with_accessor("owner_id", getter(|p: &Pet| Value::Int64(p.owner_id)))
    }
}

/// Abstract pet supertype for the joined-table hierarchy tests.
#[derive(Debug)]
pub struct PetBase;

impl EntityType for PetBase {
    const NAME: &'static str = "PetBase";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::interface("PetBase")
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(PropertyDef::new(
                "name",
                PropertyType::scalar(ScalarType::String),
            ))
            .with_property(PropertyDef::new("status", status_type()))
            .with_property(PropertyDef::new(
                "owner_id",
                PropertyType::scalar(ScalarType::Int64),
            ))
    }
}

/// A concrete pet implementing [`PetBase`] with one extra property.
#[derive(Debug, Clone, PartialEq)]
pub struct Dog {
    pub id: i64,
    pub name: String,
    pub status: PetStatus,
    pub owner_id: i64,
    pub trained: bool,
}

impl EntityType for Dog {
    const NAME: &'static str = "Dog";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::record("Dog")
            .extends(EntityRef::of::<PetBase>())
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(PropertyDef::new(
                "name",
                PropertyType::scalar(ScalarType::String),
            ))
            .with_property(PropertyDef::new("status", status_type()))
            .with_property(PropertyDef::new(
                "owner_id",
                PropertyType::scalar(ScalarType::Int64),
            ))
            .with_property(PropertyDef::new(
                "trained",
                PropertyType::scalar(ScalarType::Bool),
            ))
            .constructed_by(constructor(|args| {
                let id = args.next_i64()?;
                let name = args.next_string()?;
                let status = PetStatus::parse(&args.next_string()?).map_err(|reason| {
                    Error::Constructor {
                        entity: "Dog".to_string(),
                        reason,
                    }
                })?;
                let owner_id = args.next_i64()?;
                let trained = args.next_bool()?;
                Ok(Dog {
                    id,
                    name,
                    status,
                    owner_id,
                    trained,
                })
            }))
            .with_accessor("id", getter(|d: &Dog| Value::Int64(d.id)))
            .with_accessor("name", getter(|d: &Dog| Value::String(d.name.clone())))
            .with_accessor(
                "status",
                getter(|d: &Dog| Value::String(d.status.as_str().to_string())),
            )
            .with_accessor("owner_id", getter(|d: &Dog| Value::Int64(d.owner_id)))
            .with_accessor("trained", getter(|d: &Dog| Value::Bool(d.trained)))
    }
}

/// An abstract document whose `tenant` column is copied to every level.
pub struct DocBase;

impl EntityType for DocBase {
    const NAME: &'static str = "DocBase";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::interface("DocBase")
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(
                PropertyDef::new("tenant", PropertyType::scalar(ScalarType::String)).copied(),
            )
            .with_property(PropertyDef::new(
                "title",
                PropertyType::scalar(ScalarType::String),
            ))
    }
}

/// A concrete document implementing [`DocBase`], for copy-column emission.
#[derive(Debug, Clone, PartialEq)]
pub struct Memo {
    pub id: i64,
    pub tenant: String,
    pub title: String,
    pub body: String,
}

impl EntityType for Memo {
    const NAME: &'static str = "Memo";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::record("Memo")
            .extends(EntityRef::of::<DocBase>())
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(
                PropertyDef::new("tenant", PropertyType::scalar(ScalarType::String)).copied(),
            )
            .with_property(PropertyDef::new(
                "title",
                PropertyType::scalar(ScalarType::String),
            ))
            .with_property(PropertyDef::new(
                "body",
                PropertyType::scalar(ScalarType::String),
            ))
            .constructed_by(constructor(|args| {
                Ok(Memo {
                    id: args.next_i64()?,
                    tenant: args.next_string()?,
                    title: args.next_string()?,
                    body: args.next_string()?,
                })
            }))
            .with_accessor("id", getter(|m: &Memo| Value::Int64(m.id)))
            .with_accessor("tenant", getter(|m: &Memo| Value::String(m.tenant.clone())))
            .with_accessor("title", getter(|m: &Memo| Value::String(m.title.clone())))
            .with_accessor("body", getter(|m: &Memo| Value::String(m.body.clone())))
    }
}

/// A course enrolling many students (many-to-many with [`Student`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: i64,
    /// Populated by the storage adapter, never by the engine.
    pub students: Vec<i64>,
}

impl EntityType for Course {
    const NAME: &'static str = "Course";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::record("Course")
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(
                PropertyDef::new("students", PropertyType::entity_collection("Student"))
                    .with_relation(RelationDef::via(EntityRef::of::<Student>(), "id", "id")),
            )
            .constructed_by(constructor(|args| {
                let id = args.next_i64()?;
                args.skip()?; // students placeholder
                Ok(Course {
                    id,
                    students: Vec::new(),
                })
            }))
            .with_accessor("id", getter(|c: &Course| Value::Int64(c.id)))
            .with_accessor("students", getter(|_: &Course| Value::empty_collection()))
    }
}

/// A student enrolled in many courses (many-to-many with [`Course`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: i64,
    /// Populated by the storage adapter, never by the engine.
    pub courses: Vec<i64>,
}

impl EntityType for Student {
    const NAME: &'static str = "Student";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::record("Student")
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(
                PropertyDef::new("courses", PropertyType::entity_collection("Course"))
                    .with_relation(RelationDef::via(EntityRef::of::<Course>(), "id", "id")),
            )
            .constructed_by(constructor(|args| {
                let id = args.next_i64()?;
                args.skip()?; // courses placeholder
                Ok(Student {
                    id,
                    courses: Vec::new(),
                })
            }))
            .with_accessor("id", getter(|s: &Student| Value::Int64(s.id)))
            .with_accessor("courses", getter(|_: &Student| Value::empty_collection()))
    }
}

/// A note with a one-directional relation to [`Author`].
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub body: String,
    pub author_id: i64,
}

impl EntityType for Note {
    const NAME: &'static str = "Note";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::record("Note")
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(PropertyDef::new(
                "body",
                PropertyType::scalar(ScalarType::String),
            ))
            .with_property(
                PropertyDef::new("author_id", PropertyType::scalar(ScalarType::Int64))
                    .with_relation(RelationDef::via(EntityRef::of::<Author>(), "author_id", "id")),
            )
            .constructed_by(constructor(|args| {
                let id = args.next_i64()?;
                let body = args.next_string()?;
                args.skip()?;
                Ok(Note {
                    id,
                    body,
                    author_id: 0,
                })
            }))
            .with_accessor("id", getter(|n: &Note| Value::Int64(n.id)))
            .with_accessor("body", getter(|n: &Note| Value::String(n.body.clone())))
            .with_accessor("author_id", getter(|n: &Note| Value::Int64(n.author_id)))
    }
}

/// An employee with a self-referential manager relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: i64,
    pub manager_id: Option<i64>,
}

impl EntityType for Employee {
    const NAME: &'static str = "Employee";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::record("Employee")
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(
                PropertyDef::new("manager_id", PropertyType::optional_scalar(ScalarType::Int64))
                    .with_relation(RelationDef::via(
                        EntityRef::of::<Employee>(),
                        "manager_id",
                        "id",
                    )),
            )
            .constructed_by(constructor(|args| {
                let id = args.next_i64()?;
                args.skip()?;
                Ok(Employee {
                    id,
                    manager_id: None,
                })
            }))
            .with_accessor("id", getter(|e: &Employee| Value::Int64(e.id)))
            .with_accessor(
                "manager_id",
                getter(|e: &Employee| e.manager_id.into()),
            )
    }
}

/// An event exercising the temporal and UUID marshaller defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: [u8; 16],
    pub occurred_at: i64,
    pub on_day: i32,
}

impl EntityType for Event {
    const NAME: &'static str = "Event";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::record("Event")
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Uuid)).identifier(),
            )
            .with_property(PropertyDef::new(
                "occurred_at",
                PropertyType::scalar(ScalarType::Timestamp),
            ))
            .with_property(PropertyDef::new(
                "on_day",
                PropertyType::scalar(ScalarType::Date),
            ))
            .constructed_by(constructor(|args| {
                Ok(Event {
                    id: args.next_uuid()?,
                    occurred_at: args.next_timestamp()?,
                    on_day: args.next_date()?,
                })
            }))
            .with_accessor("id", getter(|e: &Event| Value::Uuid(e.id)))
            .with_accessor(
                "occurred_at",
                getter(|e: &Event| Value::Timestamp(e.occurred_at)),
            )
            .with_accessor("on_day", getter(|e: &Event| Value::Date(e.on_day)))
    }
}

/// A class-like entity; metadata construction must reject it.
pub struct Mutable;

impl EntityType for Mutable {
    const NAME: &'static str = "Mutable";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::class("Mutable")
    }
}

/// A record whose `cursed` accessor always fails, for the best-effort
/// deconstruction path.
#[derive(Debug, Clone, PartialEq)]
pub struct Flaky {
    pub id: i64,
}

impl EntityType for Flaky {
    const NAME: &'static str = "Flaky";

    fn declaration() -> EntityDeclaration {
        EntityDeclaration::record("Flaky")
            .with_property(
                PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64)).identifier(),
            )
            .with_property(PropertyDef::new(
                "cursed",
                PropertyType::scalar(ScalarType::String),
            ))
            .constructed_by(constructor(|args| {
                let id = args.next_i64()?;
                args.skip()?;
                Ok(Flaky { id })
            }))
            .with_accessor("id", getter(|f: &Flaky| Value::Int64(f.id)))
            .with_accessor(
                "cursed",
                Arc::new(|_| Err("accessor deliberately broken".to_string())),
            )
    }
}

/// A complete storage-keyed source map for [`Pet`].
pub fn sample_pet_map() -> PropertyMap {
    PropertyMap::new()
        .with("id", 7i64)
        .with("name", "Rex")
        .with("status", "available")
        .with("owner", 3i64)
}
