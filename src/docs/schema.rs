use serde_json::{json, Map, Value};

/// Type descriptor used in route documentation.
///
/// Types are nullable unless wrapped with [`Schema::non_nullable`].
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: SchemaKind,
    nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String,
    Number,
    Integer,
    Boolean,
    /// One of a fixed set of string literals.
    Union(Vec<String>),
    List(Box<Schema>),
    Object(Vec<(String, Schema)>),
    /// Free-form JSON.
    Any,
}

impl Schema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    pub fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    pub fn union<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::of(SchemaKind::Union(options.into_iter().map(Into::into).collect()))
    }

    pub fn list(item: Schema) -> Self {
        Self::of(SchemaKind::List(Box::new(item)))
    }

    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self::of(SchemaKind::Object(
            fields.into_iter().map(|(k, s)| (k.into(), s)).collect(),
        ))
    }

    pub fn non_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// OpenAPI 3.0 schema object.
    pub fn to_openapi(&self) -> Value {
        let mut schema = match &self.kind {
            SchemaKind::String => json!({ "type": "string" }),
            SchemaKind::Number => json!({ "type": "number" }),
            SchemaKind::Integer => json!({ "type": "integer" }),
            SchemaKind::Boolean => json!({ "type": "boolean" }),
            SchemaKind::Union(options) => json!({ "type": "string", "enum": options }),
            SchemaKind::List(item) => json!({ "type": "array", "items": item.to_openapi() }),
            SchemaKind::Object(fields) => object_schema(fields),
            SchemaKind::Any => json!({}),
        };

        if self.nullable && self.kind != SchemaKind::Any {
            schema["nullable"] = Value::Bool(true);
        }
        schema
    }
}

/// Object schema for a field list; non-nullable fields are `required`.
pub fn object_schema(fields: &[(String, Schema)]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for (name, schema) in fields {
        properties.insert(name.clone(), schema.to_openapi());
        if !schema.is_nullable() {
            required.push(Value::String(name.clone()));
        }
    }

    let mut object = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        object["required"] = Value::Array(required);
    }
    object
}
