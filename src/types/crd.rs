// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionNames, CustomResourceDefinitionSpec,
    CustomResourceDefinitionVersion, CustomResourceValidation, JSONSchemaProps,
};
use kube::api::ObjectMeta;

use crate::constants::crd;

/// Naming and versions of a namespaced CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdSpec {
    pub name: String,
    pub group: String,
    pub plural: String,
    pub singular: String,
    pub kind: String,
    /// Served versions; the first one is the storage version
    pub versions: Vec<String>,
}

impl Default for CrdSpec {
    fn default() -> Self {
        Self {
            name: crd::NAME.to_string(),
            group: crd::GROUP.to_string(),
            plural: crd::PLURAL.to_string(),
            singular: crd::SINGULAR.to_string(),
            kind: crd::KIND.to_string(),
            versions: vec![crd::VERSION.to_string()],
        }
    }
}

impl CrdSpec {
    /// The API server only accepts CRDs named `<plural>.<group>`
    pub fn has_canonical_name(&self) -> bool {
        self.name == format!("{}.{}", self.plural, self.group)
    }

    /// Build the CustomResourceDefinition manifest
    pub fn to_crd(&self) -> CustomResourceDefinition {
        let versions = self
            .versions
            .iter()
            .enumerate()
            .map(|(i, name)| CustomResourceDefinitionVersion {
                name: name.clone(),
                served: true,
                storage: i == 0,
                schema: Some(open_schema()),
                ..Default::default()
            })
            .collect();

        CustomResourceDefinition {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                ..Default::default()
            },
            spec: CustomResourceDefinitionSpec {
                group: self.group.clone(),
                scope: "Namespaced".to_string(),
                names: CustomResourceDefinitionNames {
                    plural: self.plural.clone(),
                    singular: Some(self.singular.clone()),
                    kind: self.kind.clone(),
                    ..Default::default()
                },
                versions,
                ..Default::default()
            },
            status: None,
        }
    }
}

/// apiextensions/v1 requires a schema; accept any object
fn open_schema() -> CustomResourceValidation {
    CustomResourceValidation {
        open_api_v3_schema: Some(JSONSchemaProps {
            type_: Some("object".to_string()),
            x_kubernetes_preserve_unknown_fields: Some(true),
            ..Default::default()
        }),
    }
}
