use jaxscope_api::{
    Annotation, ClassInfo, ClassKind, Modifier, ServletMetaData, WebDescriptor, names,
};
use jaxscope_core::{BuildUnit, InMemoryIndex, IndexClassResolver};
use std::sync::Arc;

pub const DISPATCHER: &str = "org.jboss.wsf.spi.deployment.WSFServlet";

#[allow(dead_code)]
pub fn application(name: &str, path: Option<&str>) -> ClassInfo {
    let mut class = ClassInfo::new(name, ClassKind::Class);
    class.super_name = Some(names::APPLICATION.to_string());
    if let Some(path) = path {
        class
            .annotations
            .push(Annotation::with_value(names::APPLICATION_PATH, path));
    }
    class
}

#[allow(dead_code)]
pub fn resource(name: &str) -> ClassInfo {
    let mut class = ClassInfo::new(name, ClassKind::Class);
    class
        .annotations
        .push(Annotation::with_value(names::PATH, format!("/{}", simple(name))));
    class
}

#[allow(dead_code)]
pub fn resource_interface(name: &str) -> ClassInfo {
    let mut class = resource(name);
    class.kind = ClassKind::Interface;
    class.modifiers = vec![Modifier::Public, Modifier::Abstract];
    class
}

#[allow(dead_code)]
pub fn implementor(name: &str, interface: &str) -> ClassInfo {
    let mut class = ClassInfo::new(name, ClassKind::Class);
    class.interfaces.push(interface.to_string());
    class
}

#[allow(dead_code)]
pub fn provider(name: &str) -> ClassInfo {
    let mut class = ClassInfo::new(name, ClassKind::Class);
    class.annotations.push(Annotation::marker(names::PROVIDER));
    class
}

#[allow(dead_code)]
pub fn servlet(name: &str, class: &str) -> ServletMetaData {
    let mut servlet = ServletMetaData::named(name);
    servlet.servlet_class = Some(class.to_string());
    servlet
}

fn simple(name: &str) -> String {
    jaxscope_api::simple_name(name).to_lowercase()
}

/// Builds a unit over an in-memory index. The dispatcher class is always
/// resolvable.
pub struct UnitFixture {
    id: String,
    parent: Option<String>,
    dependencies: Vec<String>,
    classes: Vec<ClassInfo>,
    visible: Vec<String>,
    descriptor: Option<WebDescriptor>,
}

#[allow(dead_code)]
impl UnitFixture {
    pub fn library(id: &str) -> Self {
        Self {
            id: id.to_string(),
            parent: None,
            dependencies: Vec::new(),
            classes: Vec::new(),
            visible: vec![DISPATCHER.to_string()],
            descriptor: None,
        }
    }

    pub fn web(id: &str, descriptor: WebDescriptor) -> Self {
        let mut fixture = Self::library(id);
        fixture.descriptor = Some(descriptor);
        fixture
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.dependencies = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn class(mut self, class: ClassInfo) -> Self {
        self.classes.push(class);
        self
    }

    /// Makes classes indexed by other units loadable from this one.
    pub fn sees(mut self, names: &[&str]) -> Self {
        self.visible.extend(names.iter().map(|s| s.to_string()));
        self
    }

    pub fn build(self) -> BuildUnit {
        let index = InMemoryIndex::new(self.classes);
        let resolver = IndexClassResolver::new(&index, self.visible);
        let mut unit = BuildUnit::new(self.id, Arc::new(index), Arc::new(resolver))
            .with_dependencies(self.dependencies);
        if let Some(parent) = self.parent {
            unit = unit.with_parent(parent);
        }
        if let Some(descriptor) = self.descriptor {
            unit = unit.with_descriptor(descriptor);
        }
        unit
    }
}
