//! In-memory adapters for the index and class loading capabilities.
//!
//! Hosts that already hold a parsed class index hand it to the pipeline as a
//! list of [`ClassInfo`] entries; these adapters answer the hierarchy and
//! annotation queries over that list.

use jaxscope_api::{
    AnnotationIndex, AnnotationInstance, AnnotationTarget, ClassHandle, ClassInfo, ClassResolver,
    DotName, ResolveError,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    classes: BTreeMap<DotName, ClassInfo>,
    /// super name -> direct subclasses
    subclasses: HashMap<DotName, Vec<DotName>>,
    /// interface name -> classes and interfaces listing it directly
    implementors: HashMap<DotName, Vec<DotName>>,
}

impl InMemoryIndex {
    pub fn new(classes: impl IntoIterator<Item = ClassInfo>) -> Self {
        let mut index = Self::default();
        for class in classes {
            index.insert(class);
        }
        index
    }

    pub fn insert(&mut self, class: ClassInfo) {
        if let Some(previous) = self.classes.remove(&class.name) {
            self.unlink(&previous);
        }
        if let Some(super_name) = &class.super_name {
            self.subclasses
                .entry(super_name.clone())
                .or_default()
                .push(class.name.clone());
        }
        for iface in &class.interfaces {
            self.implementors
                .entry(iface.clone())
                .or_default()
                .push(class.name.clone());
        }
        self.classes.insert(class.name.clone(), class);
    }

    fn unlink(&mut self, class: &ClassInfo) {
        if let Some(super_name) = &class.super_name {
            if let Some(children) = self.subclasses.get_mut(super_name) {
                children.retain(|c| c != &class.name);
            }
        }
        for iface in &class.interfaces {
            if let Some(children) = self.implementors.get_mut(iface) {
                children.retain(|c| c != &class.name);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    fn subclass_names(&self, name: &str) -> BTreeSet<DotName> {
        let mut found = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            if let Some(children) = self.subclasses.get(current) {
                for child in children {
                    if found.insert(child.clone()) {
                        queue.push_back(child.as_str());
                    }
                }
            }
        }
        found
    }

    fn resolve_all(&self, names: BTreeSet<DotName>) -> Vec<ClassInfo> {
        names
            .iter()
            .filter_map(|n| self.classes.get(n).cloned())
            .collect()
    }
}

impl AnnotationIndex for InMemoryIndex {
    fn find_annotated(&self, name: &str) -> Vec<AnnotationInstance> {
        let mut found = Vec::new();
        for class in self.classes.values() {
            if let Some(annotation) = class.annotation(name) {
                found.push(AnnotationInstance {
                    name: annotation.name.clone(),
                    target: AnnotationTarget::Class(class.clone()),
                    value: annotation.value.clone(),
                });
            }
            for method in &class.methods {
                for annotation in method.annotations.iter().filter(|a| a.name == name) {
                    found.push(AnnotationInstance {
                        name: annotation.name.clone(),
                        target: AnnotationTarget::Method {
                            owner: class.name.clone(),
                            name: method.name.clone(),
                        },
                        value: annotation.value.clone(),
                    });
                }
            }
            for field in &class.fields {
                for annotation in field.annotations.iter().filter(|a| a.name == name) {
                    found.push(AnnotationInstance {
                        name: annotation.name.clone(),
                        target: AnnotationTarget::Field {
                            owner: class.name.clone(),
                            name: field.name.clone(),
                        },
                        value: annotation.value.clone(),
                    });
                }
            }
        }
        found
    }

    fn find_subtypes(&self, name: &str) -> Vec<ClassInfo> {
        self.resolve_all(self.subclass_names(name))
    }

    fn find_implementors(&self, name: &str) -> Vec<ClassInfo> {
        let mut result = BTreeSet::new();
        let mut seen_interfaces = BTreeSet::from([name.to_string()]);
        let mut queue: VecDeque<DotName> = VecDeque::from([name.to_string()]);

        while let Some(iface) = queue.pop_front() {
            let Some(direct) = self.implementors.get(&iface) else {
                continue;
            };
            for implementor in direct {
                let is_interface = self
                    .classes
                    .get(implementor)
                    .map(ClassInfo::is_interface)
                    .unwrap_or(false);
                if is_interface {
                    if seen_interfaces.insert(implementor.clone()) {
                        queue.push_back(implementor.clone());
                    }
                } else {
                    result.insert(implementor.clone());
                    result.extend(self.subclass_names(implementor));
                }
            }
        }

        self.resolve_all(result)
    }

    fn class_by_name(&self, name: &str) -> Option<ClassInfo> {
        self.classes.get(name).cloned()
    }
}

/// Resolves every indexed class plus an explicit set of classes visible to the
/// unit from elsewhere (container or library classes).
#[derive(Debug, Clone, Default)]
pub struct IndexClassResolver {
    known: BTreeMap<DotName, ClassInfo>,
    visible: BTreeSet<DotName>,
}

impl IndexClassResolver {
    pub fn new(index: &InMemoryIndex, visible: impl IntoIterator<Item = DotName>) -> Self {
        Self {
            known: index
                .classes()
                .map(|c| (c.name.clone(), c.clone()))
                .collect(),
            visible: visible.into_iter().collect(),
        }
    }
}

impl ClassResolver for IndexClassResolver {
    fn load(&self, name: &str) -> Result<ClassHandle, ResolveError> {
        if let Some(info) = self.known.get(name) {
            return Ok(ClassHandle {
                name: name.to_string(),
                info: Some(info.clone()),
            });
        }
        if self.visible.contains(name) {
            return Ok(ClassHandle {
                name: name.to_string(),
                info: None,
            });
        }
        Err(ResolveError::ClassNotFound(name.to_string()))
    }
}

/// Superclass lookups across a unit's own index and the indexes of the units
/// it depends on, searched in that order.
pub struct ClassHierarchy<'a> {
    indexes: Vec<&'a dyn AnnotationIndex>,
}

impl<'a> ClassHierarchy<'a> {
    pub fn new(indexes: Vec<&'a dyn AnnotationIndex>) -> Self {
        Self { indexes }
    }

    pub fn class_info(&self, name: &str) -> Option<ClassInfo> {
        self.indexes.iter().find_map(|index| index.class_by_name(name))
    }

    /// Whether the loaded class is `ancestor` or extends it. Superclasses
    /// missing from every index end the walk.
    pub fn extends(&self, handle: &ClassHandle, ancestor: &str) -> bool {
        if handle.name == ancestor {
            return true;
        }
        let mut seen = HashSet::from([handle.name.clone()]);
        let mut current = handle
            .info
            .clone()
            .or_else(|| self.class_info(&handle.name));
        while let Some(class) = current {
            let Some(super_name) = class.super_name else {
                return false;
            };
            if super_name == ancestor {
                return true;
            }
            if !seen.insert(super_name.clone()) {
                return false;
            }
            current = self.class_info(&super_name);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jaxscope_api::{Annotation, ClassKind, MemberInfo, names};

    fn class(name: &str, super_name: Option<&str>, interfaces: &[&str]) -> ClassInfo {
        let mut info = ClassInfo::new(name, ClassKind::Class);
        info.super_name = super_name.map(str::to_string);
        info.interfaces = interfaces.iter().map(|s| s.to_string()).collect();
        info
    }

    fn names_of(classes: Vec<ClassInfo>) -> Vec<String> {
        classes.into_iter().map(|c| c.name).collect()
    }

    #[test]
    fn subtypes_are_transitive() {
        let index = InMemoryIndex::new(vec![
            class("a.Base", Some(names::APPLICATION), &[]),
            class("a.Mid", Some("a.Base"), &[]),
            class("a.Leaf", Some("a.Mid"), &[]),
            class("a.Other", None, &[]),
        ]);
        assert_eq!(
            names_of(index.find_subtypes(names::APPLICATION)),
            vec!["a.Base", "a.Leaf", "a.Mid"]
        );
    }

    #[test]
    fn implementors_follow_subinterfaces_and_subclasses() {
        let mut sub_iface = ClassInfo::new("a.SubApi", ClassKind::Interface);
        sub_iface.interfaces = vec!["a.Api".to_string()];
        let index = InMemoryIndex::new(vec![
            ClassInfo::new("a.Api", ClassKind::Interface),
            sub_iface,
            class("a.Direct", None, &["a.Api"]),
            class("a.Indirect", None, &["a.SubApi"]),
            class("a.Child", Some("a.Direct"), &[]),
        ]);
        assert_eq!(
            names_of(index.find_implementors("a.Api")),
            vec!["a.Child", "a.Direct", "a.Indirect"]
        );
    }

    #[test]
    fn annotated_reports_every_target_kind() {
        let mut info = class("a.Widget", None, &[]);
        info.annotations.push(Annotation::with_value(names::PATH, "/widgets"));
        info.methods.push(MemberInfo {
            name: "get".to_string(),
            annotations: vec![Annotation::with_value(names::PATH, "{id}")],
        });
        info.fields.push(MemberInfo {
            name: "helper".to_string(),
            annotations: vec![Annotation::marker(names::PATH)],
        });
        let index = InMemoryIndex::new(vec![info]);

        let found = index.find_annotated(names::PATH);
        assert_eq!(found.len(), 3);
        assert!(matches!(found[0].target, AnnotationTarget::Class(_)));
        assert_eq!(found[0].value.as_deref(), Some("/widgets"));
        assert!(matches!(found[1].target, AnnotationTarget::Method { .. }));
        assert!(matches!(found[2].target, AnnotationTarget::Field { .. }));
    }

    #[test]
    fn reinserting_a_class_replaces_its_links() {
        let mut index = InMemoryIndex::new(vec![class("a.App", Some(names::APPLICATION), &[])]);
        index.insert(class("a.App", None, &[]));
        assert!(index.find_subtypes(names::APPLICATION).is_empty());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn hierarchy_walks_superclasses_across_indexes() {
        let own = InMemoryIndex::new(vec![class("w.ShopApp", Some("l.BaseApp"), &[])]);
        let lib = InMemoryIndex::new(vec![
            class("l.BaseApp", Some(names::APPLICATION), &[]),
            class("l.Plain", Some("l.Missing"), &[]),
        ]);
        let hierarchy = ClassHierarchy::new(vec![&own as &dyn AnnotationIndex, &lib]);
        let handle = |name: &str| ClassHandle {
            name: name.to_string(),
            info: None,
        };

        assert!(hierarchy.extends(&handle("w.ShopApp"), names::APPLICATION));
        assert!(hierarchy.extends(&handle("l.BaseApp"), names::APPLICATION));
        assert!(hierarchy.extends(&handle(names::APPLICATION), names::APPLICATION));
        assert!(!hierarchy.extends(&handle("l.Plain"), names::APPLICATION));
        assert!(!hierarchy.extends(&handle("x.Unknown"), names::APPLICATION));
    }

    #[test]
    fn hierarchy_stops_on_cycles() {
        let index = InMemoryIndex::new(vec![
            class("a.A", Some("a.B"), &[]),
            class("a.B", Some("a.A"), &[]),
        ]);
        let hierarchy = ClassHierarchy::new(vec![&index as &dyn AnnotationIndex]);
        let handle = ClassHandle {
            name: "a.A".to_string(),
            info: index.class_by_name("a.A"),
        };
        assert!(!hierarchy.extends(&handle, names::APPLICATION));
    }

    #[test]
    fn resolver_sees_indexed_and_visible_classes() {
        let index = InMemoryIndex::new(vec![class("a.App", None, &[])]);
        let resolver =
            IndexClassResolver::new(&index, vec!["javax.servlet.http.HttpServlet".to_string()]);

        assert!(resolver.load("a.App").unwrap().info.is_some());
        assert!(
            resolver
                .load("javax.servlet.http.HttpServlet")
                .unwrap()
                .info
                .is_none()
        );
        assert_eq!(
            resolver.load("a.Missing"),
            Err(ResolveError::ClassNotFound("a.Missing".to_string()))
        );
    }
}
