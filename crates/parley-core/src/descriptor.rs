//! Static interface and method metadata.
//!
//! Descriptors are the read-only routing tables of the runtime: built once
//! at generation time, never mutated, and shared freely across client
//! proxies and dispatchers. Routing uses only the 64-bit uids; names exist
//! for diagnostics and never influence dispatch.

use std::collections::HashMap;

use crate::error::DescriptorError;

/// Stable 64-bit identifier naming an interface.
pub type InterfaceUid = u64;

/// Stable 64-bit identifier naming a method within an interface.
pub type MethodUid = u64;

/// One declared parameter: name and type label, diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub ty: &'static str,
}

/// Static metadata for one method: uid, diagnostic name, and the declared
/// request/response shape.
///
/// The uid is globally stable for a given method name + signature and is the
/// sole routing key. How it is derived is the generator's business; the
/// runtime treats it as an opaque constant.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    uid: MethodUid,
    name: &'static str,
    params: &'static [Param],
    returns: &'static str,
}

impl MethodDescriptor {
    pub const fn new(
        uid: MethodUid,
        name: &'static str,
        params: &'static [Param],
        returns: &'static str,
    ) -> Self {
        Self {
            uid,
            name,
            params,
            returns,
        }
    }

    pub fn uid(&self) -> MethodUid {
        self.uid
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared parameters, in call order.
    pub fn params(&self) -> &'static [Param] {
        self.params
    }

    /// Label of the success type.
    pub fn returns(&self) -> &'static str {
        self.returns
    }
}

/// An interface: uid, diagnostic name, and its ordered set of methods.
///
/// Construction rejects duplicate method uids; that check runs exactly once,
/// at generation/construction time, so dispatch never re-verifies it.
/// Method-uid collisions across *different* interfaces are tolerated because
/// routing always scopes by interface uid first.
#[derive(Debug)]
pub struct InterfaceDescriptor {
    uid: InterfaceUid,
    name: &'static str,
    methods: Vec<MethodDescriptor>,
    by_uid: HashMap<MethodUid, usize>,
}

impl InterfaceDescriptor {
    pub fn new(
        uid: InterfaceUid,
        name: &'static str,
        methods: Vec<MethodDescriptor>,
    ) -> Result<Self, DescriptorError> {
        let mut by_uid = HashMap::with_capacity(methods.len());
        for (index, method) in methods.iter().enumerate() {
            if by_uid.insert(method.uid(), index).is_some() {
                return Err(DescriptorError::DuplicateMethodUid {
                    interface: name,
                    uid: method.uid(),
                });
            }
        }
        Ok(Self {
            uid,
            name,
            methods,
            by_uid,
        })
    }

    pub fn uid(&self) -> InterfaceUid {
        self.uid
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// O(1) lookup by method uid.
    pub fn method(&self, uid: MethodUid) -> Option<&MethodDescriptor> {
        self.by_uid.get(&uid).map(|&index| &self.methods[index])
    }

    pub fn contains(&self, uid: MethodUid) -> bool {
        self.by_uid.contains_key(&uid)
    }

    /// Diagnostic label for a method uid: the declared name when known,
    /// the hex uid otherwise.
    pub fn method_label(&self, uid: MethodUid) -> String {
        match self.method(uid) {
            Some(method) => format!("{}::{}", self.name, method.name()),
            None => format!("{}::{:#018x}", self.name, uid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE_PARAM: &[Param] = &[Param {
        name: "size",
        ty: "Vec2f",
    }];

    fn compositor() -> InterfaceDescriptor {
        InterfaceDescriptor::new(
            0x9763fd6ae0868ca0,
            "Compositor",
            vec![
                MethodDescriptor::new(0x7110f2964d70557a, "createWindow", SIZE_PARAM, "Window"),
                MethodDescriptor::new(0x2f1f2ad770014c19, "destroyWindow", &[], "()"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_by_uid() {
        let iface = compositor();
        assert_eq!(iface.uid(), 0x9763fd6ae0868ca0);
        let method = iface.method(0x7110f2964d70557a).unwrap();
        assert_eq!(method.name(), "createWindow");
        assert_eq!(method.params().len(), 1);
        assert_eq!(method.params()[0].name, "size");
        assert_eq!(method.returns(), "Window");
        assert!(iface.method(0xdeadbeef).is_none());
    }

    #[test]
    fn test_declaration_order_preserved() {
        let iface = compositor();
        let names: Vec<_> = iface.methods().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["createWindow", "destroyWindow"]);
    }

    #[test]
    fn test_duplicate_method_uid_rejected() {
        let err = InterfaceDescriptor::new(
            0x1,
            "Broken",
            vec![
                MethodDescriptor::new(0xaa, "first", &[], "()"),
                MethodDescriptor::new(0xaa, "second", &[], "()"),
            ],
        )
        .unwrap_err();

        assert_eq!(
            err,
            DescriptorError::DuplicateMethodUid {
                interface: "Broken",
                uid: 0xaa,
            }
        );
    }

    #[test]
    fn test_method_label_falls_back_to_hex() {
        let iface = compositor();
        assert_eq!(
            iface.method_label(0x7110f2964d70557a),
            "Compositor::createWindow"
        );
        assert_eq!(
            iface.method_label(0xdeadbeef),
            "Compositor::0x00000000deadbeef"
        );
    }
}
