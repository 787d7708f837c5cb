// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec as K8sDeploymentSpec};
use k8s_openapi::api::core::v1::{Container, ContainerPort, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;

use crate::constants::deployment;

/// Desired state of the walkthrough deployment
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentSpec {
    pub name: String,
    pub replicas: i32,
    /// Value of the `app` label shared by the selector and the pod template
    pub app_label: String,
    pub container_name: String,
    pub image: String,
    pub port_name: String,
    pub port: i32,
    pub protocol: String,
}

impl Default for DeploymentSpec {
    fn default() -> Self {
        Self {
            name: deployment::NAME.to_string(),
            replicas: deployment::REPLICAS,
            app_label: deployment::APP_LABEL.to_string(),
            container_name: deployment::CONTAINER_NAME.to_string(),
            image: deployment::IMAGE.to_string(),
            port_name: deployment::PORT_NAME.to_string(),
            port: deployment::PORT,
            protocol: "TCP".to_string(),
        }
    }
}

impl DeploymentSpec {
    fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("app".to_string(), self.app_label.clone())])
    }

    /// Build the Deployment manifest
    pub fn to_deployment(&self) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                ..Default::default()
            },
            spec: Some(K8sDeploymentSpec {
                replicas: Some(self.replicas),
                selector: LabelSelector {
                    match_labels: Some(self.labels()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(self.labels()),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![Container {
                            name: self.container_name.clone(),
                            image: Some(self.image.clone()),
                            ports: Some(vec![ContainerPort {
                                name: Some(self.port_name.clone()),
                                protocol: Some(self.protocol.clone()),
                                container_port: self.port,
                                ..Default::default()
                            }]),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
