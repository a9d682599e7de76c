//! Test doubles shared by the pipeline tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use lexline_core::{Accept, HttpError, HttpResponse, Transport};

/// One recorded request.
#[derive(Debug, Clone)]
pub struct Request {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub accept: Accept,
}

enum Canned {
    Response(u16, Vec<u8>),
    Failure,
}

/// In-memory transport serving canned responses per path.
///
/// Responses queue in push order per path; repeated requests to the same path
/// consume the queue (pagination). Paths without a canned response get a 404.
#[derive(Default)]
pub struct FakeTransport {
    canned: RefCell<HashMap<String, VecDeque<Canned>>>,
    requests: RefCell<Vec<Request>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.canned
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push_back(Canned::Response(status, body.into()));
    }

    pub fn push_failure(&self, path: &str) {
        self.canned
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push_back(Canned::Failure);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests_for(&self, path: &str) -> usize {
        self.requests.borrow().iter().filter(|r| r.path == path).count()
    }
}

impl Transport for FakeTransport {
    fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        accept: Accept,
    ) -> Result<HttpResponse, HttpError> {
        self.requests.borrow_mut().push(Request {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            accept,
        });

        match self
            .canned
            .borrow_mut()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
        {
            Some(Canned::Response(status, body)) => Ok(HttpResponse { status, body }),
            Some(Canned::Failure) => Err(HttpError::Http {
                status: None,
                message: "connection refused".to_string(),
            }),
            None => Ok(HttpResponse {
                status: 404,
                body: Vec::new(),
            }),
        }
    }
}

/// Build a list-endpoint JSON page of sequentially numbered URIs.
pub fn list_page(document_type: &str, start: usize, count: usize) -> Vec<u8> {
    let items: Vec<String> = (start..start + count)
        .map(|n| {
            format!(
                r#"{{"akn_uri": "/akn/fi/act/{document_type}/2024/{n}/fin@", "status": "NEW"}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(",")).into_bytes()
}
