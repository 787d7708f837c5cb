// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Runs an ordered list of steps against the cluster, stopping at the first failure.

pub mod plans;
pub mod step;

pub use plans::{crd_plan, deployment_plan};
pub use step::{ListWait, Manifest, ResourceKind, Step, StepOutcome};

use std::fmt::Debug;
use std::time::Duration;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{api::ListParams, Api, Client, Resource, ResourceExt};
use kube_runtime::watcher;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::kubernetes::{
    create_resource, delete_namespace, delete_resource, ensure_namespace, list_resources,
    next_poll_misses, register_crd, wait_for_established, ClientSession, CreateOutcome,
    Propagation,
};
use crate::observer::{ChangeKind, ChangeObserver, Subscription};

pub struct Orchestrator {
    session: ClientSession,
    poll_interval: Duration,
    observer: Option<ChangeObserver<Pod>>,
    event_logger: Option<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(session: ClientSession, poll_interval: Duration) -> Self {
        Self {
            session,
            poll_interval,
            observer: None,
            event_logger: None,
        }
    }

    fn client(&self) -> Client {
        self.session.client().clone()
    }

    /// The pod observer, once an observe step has run
    pub fn observer(&self) -> Option<&ChangeObserver<Pod>> {
        self.observer.as_ref()
    }

    /// Execute `steps` in order. The first failure aborts the run and is
    /// returned tagged with the step that produced it.
    pub async fn run(&mut self, steps: &[Step]) -> Result<Vec<StepOutcome>> {
        let mut outcomes = Vec::with_capacity(steps.len());
        for step in steps {
            info!("Step: {}", step);
            let outcome = self
                .execute(step)
                .await
                .map_err(|e| e.in_step(step.to_string()))?;
            debug!("Step '{}' finished: {:?}", step, outcome);
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Stop the observer and let the event logger drain what was already delivered
    pub async fn finish(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.shutdown();
        }
        if let Some(logger) = self.event_logger.take() {
            if let Err(e) = logger.await {
                warn!("Event logger ended abnormally: {}", e);
            }
        }
    }

    pub async fn execute(&mut self, step: &Step) -> Result<StepOutcome> {
        match step {
            Step::EnsureNamespace(ns) => {
                let outcome = ensure_namespace(self.session.client(), ns).await?;
                Ok(if outcome.was_created() {
                    StepOutcome::NamespaceCreated(ns.clone())
                } else {
                    StepOutcome::NamespaceExisted(ns.clone())
                })
            }
            Step::ObservePods { namespace } => self.observe_pods(namespace).await,
            Step::CreateResource {
                namespace,
                manifest,
                policy,
            } => {
                let kind = manifest.kind();
                let outcome = match manifest {
                    Manifest::Deployment(d) => {
                        let api: Api<Deployment> = Api::namespaced(self.client(), namespace);
                        named(create_resource(&api, d, *policy).await?)
                    }
                    Manifest::Crd(spec) => {
                        named(register_crd(self.session.client(), spec, *policy).await?)
                    }
                };
                Ok(match outcome {
                    CreateOutcome::Created(name) => {
                        info!("Created {} {}", kind, name);
                        StepOutcome::Created { kind, name }
                    }
                    CreateOutcome::AlreadyExisted(name) => {
                        info!("Reusing existing {} {}", kind, name);
                        StepOutcome::Reused { kind, name }
                    }
                })
            }
            Step::ListResources {
                namespace,
                kind,
                wait,
            } => {
                let names = match kind {
                    ResourceKind::Pod => {
                        let api: Api<Pod> = Api::namespaced(self.client(), namespace);
                        self.list_names(&api, *wait).await?
                    }
                    ResourceKind::Deployment => {
                        let api: Api<Deployment> = Api::namespaced(self.client(), namespace);
                        self.list_names(&api, *wait).await?
                    }
                    ResourceKind::CustomResourceDefinition => {
                        let api: Api<CustomResourceDefinition> = Api::all(self.client());
                        self.list_names(&api, *wait).await?
                    }
                };
                for name in &names {
                    info!("{} {}", kind, name);
                }
                Ok(StepOutcome::Listed { kind: *kind, names })
            }
            Step::DeleteResource {
                namespace,
                kind,
                name,
                propagation,
            } => {
                match kind {
                    ResourceKind::Pod => {
                        let api: Api<Pod> = Api::namespaced(self.client(), namespace);
                        self.delete(&api, name, *propagation).await?
                    }
                    ResourceKind::Deployment => {
                        let api: Api<Deployment> = Api::namespaced(self.client(), namespace);
                        self.delete(&api, name, *propagation).await?
                    }
                    ResourceKind::CustomResourceDefinition => {
                        let api: Api<CustomResourceDefinition> = Api::all(self.client());
                        self.delete(&api, name, *propagation).await?
                    }
                }
                info!("Deleted {} {}", kind, name);
                Ok(StepOutcome::Deleted {
                    kind: *kind,
                    name: name.clone(),
                })
            }
            Step::DeleteNamespace(ns) => {
                delete_namespace(self.session.client(), ns).await?;
                Ok(StepOutcome::NamespaceDeleted(ns.clone()))
            }
            Step::AwaitCrdEstablished { name, timeout } => {
                let established = wait_for_established(
                    self.session.client(),
                    name,
                    self.poll_interval,
                    self.poll_interval * 8,
                    *timeout,
                )
                .await?;
                Ok(StepOutcome::CrdEstablished {
                    name: name.clone(),
                    established,
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn observe_pods(&mut self, namespace: &str) -> Result<StepOutcome> {
        if let Some(mut previous) = self.observer.take() {
            warn!("Replacing the running pod observer");
            previous.shutdown();
        }

        let mut observer = ChangeObserver::new();
        let subscription = observer.subscribe();
        self.event_logger = Some(tokio::spawn(log_changes(subscription)));

        let pods: Api<Pod> = Api::namespaced(self.client(), namespace);
        observer.start_watch(pods, watcher::Config::default());
        observer.wait_synced().await?;
        info!("Observing pods in {}", namespace);

        self.observer = Some(observer);
        Ok(StepOutcome::Observing(namespace.to_string()))
    }

    async fn list_names<K>(&self, api: &Api<K>, wait: Option<ListWait>) -> Result<Vec<String>>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
    {
        let params = ListParams::default();
        let Some(wait) = wait else {
            return Ok(names(list_resources(api, &params).await?));
        };

        let deadline = Instant::now().checked_add(wait.timeout);
        loop {
            let items = list_resources(api, &params).await?;
            if items.len() >= wait.min_items {
                return Ok(names(items));
            }
            if next_poll_misses(deadline, self.poll_interval) {
                warn!(
                    "Only {} of {} expected items after {:?}",
                    items.len(),
                    wait.min_items,
                    wait.timeout
                );
                return Ok(names(items));
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn delete<K>(&self, api: &Api<K>, name: &str, propagation: Propagation) -> Result<()>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
    {
        delete_resource(api, name, propagation, self.poll_interval).await
    }
}

fn named<K: Resource>(outcome: CreateOutcome<K>) -> CreateOutcome<String> {
    match outcome {
        CreateOutcome::Created(k) => CreateOutcome::Created(k.name_any()),
        CreateOutcome::AlreadyExisted(k) => CreateOutcome::AlreadyExisted(k.name_any()),
    }
}

fn names<K: Resource>(items: Vec<K>) -> Vec<String> {
    items.iter().map(|k| k.name_any()).collect()
}

async fn log_changes(mut subscription: Subscription<Pod>) {
    while let Some(change) = subscription.recv().await {
        let verb = match change.kind {
            ChangeKind::Added => "added",
            ChangeKind::Deleted => "deleted",
        };
        info!("Pod {} has been {}", change.object.name_any(), verb);
        if let Ok(yaml) = serde_yaml::to_string(&change.object) {
            debug!("Pod snapshot:\n{}", yaml);
        }
    }
}
