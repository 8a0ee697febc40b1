//! Field keys of values crossing between serde and the execution engine.
//!
//! serde reads and writes the fields of a composite type under their declared names, the
//! execution engine under their exposed names.

use crate::configuration::FieldNaming;
use crate::descriptor::Capabilities;
use crate::descriptor::TypeDescriptor;
use crate::descriptor::Wrapper;
use crate::json_ext::Object;
use crate::json_ext::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Declared,
    Exposed,
}

/// Renames the fields of values of one type, nested values included.
#[derive(Clone, Debug)]
pub(crate) struct FieldKeys {
    descriptor: TypeDescriptor,
    naming: FieldNaming,
}

impl FieldKeys {
    pub(crate) fn new(descriptor: TypeDescriptor, naming: FieldNaming) -> Self {
        Self { descriptor, naming }
    }

    /// Keys `value`, as received from the execution engine, by declared name.
    pub(crate) fn to_declared(&self, value: Value) -> Value {
        rekey(&self.descriptor, self.naming, value, Side::Declared)
    }

    /// Keys `value`, as serialized by serde, by exposed name.
    pub(crate) fn to_exposed(&self, value: Value) -> Value {
        rekey(&self.descriptor, self.naming, value, Side::Exposed)
    }
}

fn rekey(descriptor: &TypeDescriptor, naming: FieldNaming, value: Value, side: Side) -> Value {
    match (descriptor.outer(), value) {
        (Some(Wrapper::List), Value::Array(items)) => {
            let element = descriptor.strip_outer();
            Value::Array(
                items
                    .into_iter()
                    .map(|item| rekey(&element, naming, item, side))
                    .collect(),
            )
        }
        (Some(_), value) => rekey(&descriptor.strip_outer(), naming, value, side),
        (None, Value::Object(object)) => match descriptor.capabilities() {
            Some(caps) => Value::Object(rekey_object(caps, naming, object, side)),
            None => Value::Object(object),
        },
        (None, value) => value,
    }
}

fn rekey_object(caps: &Capabilities, naming: FieldNaming, object: Object, side: Side) -> Object {
    let fields: Vec<_> = caps
        .fields()
        .into_iter()
        .map(|decl| {
            let declared = decl.name().to_string();
            let exposed = decl.exposed_name(naming);
            match side {
                Side::Declared => (exposed, declared, decl.ty),
                Side::Exposed => (declared, exposed, decl.ty),
            }
        })
        .collect();

    let mut rekeyed = Object::new();
    for (key, value) in object {
        match fields.iter().find(|(from, ..)| from.as_str() == key.as_str()) {
            Some((_, to, ty)) => {
                rekeyed.insert(to.as_str(), rekey(&ty(), naming, value, side));
            }
            None => {
                rekeyed.insert(key, value);
            }
        }
    }
    rekeyed
}
