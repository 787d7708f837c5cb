// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! An in-memory Kubernetes API server for tests.
//!
//! Keeps objects per collection path, answers create/get/list/delete, runs a
//! minimal deployment controller (pods owned by the deployment), models
//! foreground deletion latency and serves watch streams.

use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Full, StreamBody};
use hyper::body::Frame;
use kube::client::Body;
use kube::Client;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tower::{BoxError, Service};

type FakeBody = UnsyncBoxBody<Bytes, BoxError>;

const NAMESPACES: &str = "/api/v1/namespaces";
const PLURALS: &[&str] = &["namespaces", "pods", "deployments", "customresourcedefinitions"];

/// A fake API server; clones share the same state
#[derive(Clone)]
pub struct FakeApiServer {
    state: Arc<Mutex<State>>,
}

struct Watcher {
    collection: String,
    tx: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct State {
    /// collection path -> name -> object
    objects: BTreeMap<String, BTreeMap<String, Value>>,
    resource_version: u64,
    /// (resource version, collection, watch event line)
    events: Vec<(u64, String, String)>,
    watchers: Vec<Watcher>,
    deletion_order: Vec<String>,
    deletion_latency: Duration,
    crds_pending: bool,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Start with an existing namespace
    pub fn with_namespace(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let ns = json!({
                "apiVersion": "v1",
                "kind": "Namespace",
                "metadata": { "name": name },
                "status": { "phase": "Active" }
            });
            state.insert(NAMESPACES, ns);
        }
        self
    }

    /// How long a foreground deletion keeps the owner around while dependents go away
    pub fn with_deletion_latency(self, latency: Duration) -> Self {
        self.state.lock().unwrap().deletion_latency = latency;
        self
    }

    /// Never mark created CRDs as established
    pub fn with_crds_pending(self) -> Self {
        self.state.lock().unwrap().crds_pending = true;
        self
    }

    /// Build a kube Client talking to this server
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.state.lock().unwrap().get(NAMESPACES, name).is_some()
    }

    /// `<plural>/<name>` of every removed object, in removal order
    pub fn deletion_order(&self) -> Vec<String> {
        self.state.lock().unwrap().deletion_order.clone()
    }

    fn handle(&self, method: &Method, path: &str, query: &str, body: &[u8]) -> Response<FakeBody> {
        let (collection, name) = split_path(path);
        let params = parse_query(query);

        match (method.clone(), name) {
            (Method::GET, None) if params.get("watch").is_some_and(|w| w == "true" || w == "1") => {
                let since = params
                    .get("resourceVersion")
                    .and_then(|rv| rv.parse().ok())
                    .unwrap_or(0);
                self.watch(&collection, since)
            }
            (Method::GET, None) => {
                let state = self.state.lock().unwrap();
                json_response(200, &state.list(&collection))
            }
            (Method::GET, Some(name)) => {
                let state = self.state.lock().unwrap();
                match state.get(&collection, &name) {
                    Some(obj) => json_response(200, obj),
                    None => not_found(&collection, &name),
                }
            }
            (Method::POST, None) => match serde_json::from_slice::<Value>(body) {
                Ok(obj) => self.create(&collection, obj),
                Err(e) => json_response(400, &status_json(400, "BadRequest", &e.to_string())),
            },
            (Method::DELETE, Some(name)) => {
                let foreground = serde_json::from_slice::<Value>(body)
                    .ok()
                    .and_then(|v| v.get("propagationPolicy").cloned())
                    .is_some_and(|p| p == "Foreground");
                self.delete(&collection, &name, foreground)
            }
            _ => json_response(
                405,
                &status_json(405, "MethodNotAllowed", "method not supported by fake"),
            ),
        }
    }

    fn create(&self, collection: &str, mut obj: Value) -> Response<FakeBody> {
        let mut state = self.state.lock().unwrap();
        let name = obj["metadata"]["name"].as_str().unwrap_or_default().to_string();

        if let Some(ns) = namespace_of(collection) {
            if state.get(NAMESPACES, &ns).is_none() {
                return not_found(NAMESPACES, &ns);
            }
            obj["metadata"]["namespace"] = json!(ns);
        }
        if state.get(collection, &name).is_some() {
            let message = format!("{} \"{}\" already exists", plural(collection), name);
            return json_response(409, &status_json(409, "AlreadyExists", &message));
        }

        match plural(collection) {
            "namespaces" => obj["status"] = json!({ "phase": "Active" }),
            "customresourcedefinitions" if !state.crds_pending => {
                let stored: Vec<Value> = obj["spec"]["versions"]
                    .as_array()
                    .map(|versions| {
                        versions
                            .iter()
                            .filter(|v| v["storage"] == true)
                            .map(|v| v["name"].clone())
                            .collect()
                    })
                    .unwrap_or_default();
                let status = json!({
                    "acceptedNames": obj["spec"]["names"].clone(),
                    "storedVersions": stored,
                    "conditions": [{ "type": "Established", "status": "True" }]
                });
                obj["status"] = status;
            }
            _ => {}
        }

        let created = state.insert(collection, obj);
        if plural(collection) == "deployments" {
            state.spawn_pods(collection, &created);
        }
        json_response(201, &created)
    }

    fn delete(&self, collection: &str, name: &str, foreground: bool) -> Response<FakeBody> {
        let mut state = self.state.lock().unwrap();
        let Some(obj) = state.get(collection, name).cloned() else {
            return not_found(collection, name);
        };

        match plural(collection) {
            "namespaces" => {
                let nested: Vec<String> = state
                    .objects
                    .keys()
                    .filter(|c| namespace_of(c).as_deref() == Some(name))
                    .cloned()
                    .collect();
                for c in nested {
                    let names: Vec<String> = state.objects[&c].keys().cloned().collect();
                    for n in names {
                        state.remove(&c, &n);
                    }
                }
                state.remove(collection, name);
                let mut terminating = obj;
                terminating["status"] = json!({ "phase": "Terminating" });
                json_response(200, &terminating)
            }
            "deployments" if foreground => {
                let mut pending = obj;
                pending["metadata"]["deletionTimestamp"] = json!("2026-01-01T00:00:00Z");
                pending["metadata"]["finalizers"] = json!(["foregroundDeletion"]);
                let pending = state.replace(collection, pending);

                let latency = state.deletion_latency;
                let server = self.clone();
                let collection = collection.to_string();
                let name = name.to_string();
                let uid = uid_of(&pending);
                tokio::spawn(async move {
                    tokio::time::sleep(latency).await;
                    let mut state = server.state.lock().unwrap();
                    state.remove_owned_pods(&collection, &uid);
                    state.remove(&collection, &name);
                });
                json_response(200, &pending)
            }
            _ => {
                state.remove(collection, name);
                if plural(collection) == "deployments" {
                    state.remove_owned_pods(collection, &uid_of(&obj));
                }
                json_response(
                    200,
                    &json!({
                        "kind": "Status",
                        "apiVersion": "v1",
                        "metadata": {},
                        "status": "Success",
                        "details": { "name": name, "kind": plural(collection) }
                    }),
                )
            }
        }
    }

    fn watch(&self, collection: &str, since: u64) -> Response<FakeBody> {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        {
            let mut state = self.state.lock().unwrap();
            for (rv, c, line) in &state.events {
                if *rv > since && c == collection {
                    let _ = tx.send(line.clone());
                }
            }
            state.watchers.push(Watcher {
                collection: collection.to_string(),
                tx,
            });
        }

        let lines = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv()
                .await
                .map(|line| (Ok::<_, BoxError>(Frame::data(Bytes::from(line))), rx))
        });

        Response::builder()
            .status(200)
            .header("content-type", "application/json")
            .body(StreamBody::new(lines).boxed_unsync())
            .unwrap()
    }
}

impl Default for FakeApiServer {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn get(&self, collection: &str, name: &str) -> Option<&Value> {
        self.objects.get(collection).and_then(|c| c.get(name))
    }

    fn list(&self, collection: &str) -> Value {
        let items: Vec<Value> = self
            .objects
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default();
        let (api_version, kind) = type_of(collection);
        json!({
            "apiVersion": api_version,
            "kind": format!("{}List", kind),
            "metadata": { "resourceVersion": self.resource_version.to_string() },
            "items": items
        })
    }

    fn next_version(&mut self) -> u64 {
        self.resource_version += 1;
        self.resource_version
    }

    fn insert(&mut self, collection: &str, mut obj: Value) -> Value {
        let rv = self.next_version();
        let name = obj["metadata"]["name"].as_str().unwrap_or_default().to_string();
        obj["metadata"]["uid"] = json!(format!("uid-{}", rv));
        obj["metadata"]["resourceVersion"] = json!(rv.to_string());
        self.objects
            .entry(collection.to_string())
            .or_default()
            .insert(name, obj.clone());
        self.emit(rv, collection, "ADDED", &obj);
        obj
    }

    fn replace(&mut self, collection: &str, mut obj: Value) -> Value {
        let rv = self.next_version();
        let name = obj["metadata"]["name"].as_str().unwrap_or_default().to_string();
        obj["metadata"]["resourceVersion"] = json!(rv.to_string());
        self.objects
            .entry(collection.to_string())
            .or_default()
            .insert(name, obj.clone());
        self.emit(rv, collection, "MODIFIED", &obj);
        obj
    }

    fn remove(&mut self, collection: &str, name: &str) {
        let removed = self.objects.get_mut(collection).and_then(|c| c.remove(name));
        if let Some(mut obj) = removed {
            let rv = self.next_version();
            obj["metadata"]["resourceVersion"] = json!(rv.to_string());
            self.deletion_order
                .push(format!("{}/{}", plural(collection), name));
            self.emit(rv, collection, "DELETED", &obj);
        }
    }

    fn emit(&mut self, rv: u64, collection: &str, event_type: &str, obj: &Value) {
        let line = format!("{}\n", json!({ "type": event_type, "object": obj }));
        self.events.push((rv, collection.to_string(), line.clone()));
        self.watchers
            .retain(|w| w.collection != collection || w.tx.send(line.clone()).is_ok());
    }

    /// Stand-in for the deployment and replicaset controllers
    fn spawn_pods(&mut self, deployment_collection: &str, deployment: &Value) {
        let Some(ns) = namespace_of(deployment_collection) else {
            return;
        };
        let pods = format!("{}/{}/pods", NAMESPACES, ns);
        let name = deployment["metadata"]["name"].as_str().unwrap_or_default();
        let replicas = deployment["spec"]["replicas"].as_i64().unwrap_or(1);
        let template = &deployment["spec"]["template"];

        for i in 0..replicas {
            let pod = json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {
                    "name": format!("{}-{}", name, i),
                    "namespace": ns,
                    "labels": template["metadata"]["labels"].clone(),
                    "ownerReferences": [{
                        "apiVersion": "apps/v1",
                        "kind": "Deployment",
                        "name": name,
                        "uid": uid_of(deployment),
                        "controller": true,
                        "blockOwnerDeletion": true
                    }]
                },
                "spec": template["spec"].clone(),
                "status": { "phase": "Running" }
            });
            self.insert(&pods, pod);
        }
    }

    fn remove_owned_pods(&mut self, deployment_collection: &str, owner_uid: &str) {
        let Some(ns) = namespace_of(deployment_collection) else {
            return;
        };
        let pods = format!("{}/{}/pods", NAMESPACES, ns);
        let owned: Vec<String> = self
            .objects
            .get(&pods)
            .map(|c| {
                c.iter()
                    .filter(|(_, pod)| {
                        pod["metadata"]["ownerReferences"]
                            .as_array()
                            .is_some_and(|refs| refs.iter().any(|r| r["uid"] == owner_uid))
                    })
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default();
        for name in owned {
            self.remove(&pods, &name);
        }
    }
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<FakeBody>;
    type Error = BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();
            let query = req.uri().query().unwrap_or_default().to_string();
            let body = req.into_body().collect().await?.to_bytes();
            Ok(server.handle(&method, &path, &query, &body))
        })
    }
}

/// Split a request path into its collection path and optional object name
fn split_path(path: &str) -> (String, Option<String>) {
    let path = path.trim_end_matches('/');
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.last().copied().unwrap_or_default();
    let previous = segments
        .len()
        .checked_sub(2)
        .map(|i| segments[i])
        .unwrap_or_default();

    if PLURALS.contains(&last) && previous != "namespaces" {
        (path.to_string(), None)
    } else {
        let collection = &path[..path.len() - last.len() - 1];
        (collection.to_string(), Some(last.to_string()))
    }
}

fn plural(collection: &str) -> &str {
    collection.rsplit('/').next().unwrap_or_default()
}

/// Namespace of a namespaced collection such as /api/v1/namespaces/demo/pods
fn namespace_of(collection: &str) -> Option<String> {
    let segments: Vec<&str> = collection.split('/').collect();
    let i = segments.iter().position(|s| *s == "namespaces")?;
    (segments.len() > i + 2).then(|| segments[i + 1].to_string())
}

fn type_of(collection: &str) -> (&'static str, &'static str) {
    match plural(collection) {
        "namespaces" => ("v1", "Namespace"),
        "pods" => ("v1", "Pod"),
        "deployments" => ("apps/v1", "Deployment"),
        "customresourcedefinitions" => ("apiextensions.k8s.io/v1", "CustomResourceDefinition"),
        _ => ("v1", "Unknown"),
    }
}

fn uid_of(obj: &Value) -> String {
    obj["metadata"]["uid"].as_str().unwrap_or_default().to_string()
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn full_body(bytes: Vec<u8>) -> FakeBody {
    Full::new(Bytes::from(bytes))
        .map_err(|never: Infallible| -> BoxError { match never {} })
        .boxed_unsync()
}

fn json_response(status: u16, body: &Value) -> Response<FakeBody> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(full_body(body.to_string().into_bytes()))
        .unwrap()
}

/// A failure Status object as the API server returns it
pub fn status_json(code: u16, reason: &str, message: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
}

fn not_found(collection: &str, name: &str) -> Response<FakeBody> {
    let message = format!("{} \"{}\" not found", plural(collection), name);
    json_response(404, &status_json(404, "NotFound", &message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/api/v1/namespaces"), (NAMESPACES.to_string(), None));
        assert_eq!(
            split_path("/api/v1/namespaces/demo"),
            (NAMESPACES.to_string(), Some("demo".to_string()))
        );
        assert_eq!(
            split_path("/api/v1/namespaces/demo/pods"),
            ("/api/v1/namespaces/demo/pods".to_string(), None)
        );
        assert_eq!(
            split_path("/apis/apps/v1/namespaces/demo/deployments/web"),
            (
                "/apis/apps/v1/namespaces/demo/deployments".to_string(),
                Some("web".to_string())
            )
        );
        assert_eq!(
            split_path("/apis/apiextensions.k8s.io/v1/customresourcedefinitions/pizzas.pizza.com"),
            (
                "/apis/apiextensions.k8s.io/v1/customresourcedefinitions".to_string(),
                Some("pizzas.pizza.com".to_string())
            )
        );
    }

    #[test]
    fn test_namespace_of() {
        assert_eq!(namespace_of(NAMESPACES), None);
        assert_eq!(
            namespace_of("/apis/apps/v1/namespaces/demo/deployments"),
            Some("demo".to_string())
        );
    }
}
