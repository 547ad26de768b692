use serde_json::Value;

use crate::record::JobRecord;

/// At least one job of a batch must carry these for the batch to be trusted.
const REQUIRED_FIELDS: [&str; 2] = ["id", "enqueue_time"];
const NO_JOBS_MSG: &str = "No jobs found.";

/// Shape of one listing response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    /// A non-empty batch, newest first. `rejected` counts array elements that
    /// were not JSON objects and were dropped from the batch.
    Jobs { jobs: Vec<JobRecord>, rejected: usize },
    /// An empty array or the "No jobs found." sentinel: the end of the data.
    Empty,
    /// Anything else. The description is meant for logs.
    Malformed(String),
}

impl Listing {
    /// A batch with nothing rejected.
    pub fn jobs(jobs: Vec<JobRecord>) -> Listing {
        Listing::Jobs { jobs, rejected: 0 }
    }

    pub fn classify(body: Value) -> Listing {
        if is_no_jobs_sentinel(&body) {
            return Listing::Empty;
        }
        match body {
            Value::Array(items) => classify_array(items),
            other => Listing::Malformed(describe(&other)),
        }
    }
}

fn classify_array(items: Vec<Value>) -> Listing {
    let Some(first) = items.first() else {
        return Listing::Empty;
    };
    if is_no_jobs_sentinel(first) {
        return Listing::Empty;
    }
    let looks_like_jobs = items.iter().any(|item| {
        item.as_object()
            .is_some_and(|obj| REQUIRED_FIELDS.iter().all(|field| obj.contains_key(*field)))
    });
    if !looks_like_jobs {
        return Listing::Malformed(describe(first));
    }

    let mut jobs = Vec::with_capacity(items.len());
    let mut rejected = 0;
    for item in items {
        match item {
            Value::Object(fields) => jobs.push(JobRecord::from_map(fields)),
            _ => rejected += 1,
        }
    }
    Listing::Jobs { jobs, rejected }
}

fn is_no_jobs_sentinel(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| {
        obj.len() == 1 && obj.get("msg").and_then(Value::as_str) == Some(NO_JOBS_MSG)
    })
}

fn describe(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > 200 {
        let mut cut = 200;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    format!("unexpected job listing format: {text}")
}
