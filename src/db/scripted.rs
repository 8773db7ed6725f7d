//! Scripted in-process connector for failure-injection tests.
//!
//! Queued outcomes are consumed in order; once a queue is empty every further
//! call succeeds. A broken connection fails every insert and ping until it is
//! replaced. Counters record how often each operation was attempted.
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::connection::RecordWriter;
use super::failure::{FailureKind, WriteFailure};
use crate::generator::Record;

#[derive(Default)]
struct Script {
    connect_failures: VecDeque<WriteFailure>,
    ping_failures: VecDeque<WriteFailure>,
    insert_outcomes: VecDeque<Result<(), WriteFailure>>,
    stalled_inserts: usize,
    broken: HashSet<u64>,
    connects: u64,
    pings: u64,
    inserts: Vec<(u64, String)>,
}

#[derive(Clone, Default)]
pub struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_connect(&self, failure: WriteFailure) {
        self.script.lock().unwrap().connect_failures.push_back(failure);
    }

    pub fn fail_next_ping(&self, failure: WriteFailure) {
        self.script.lock().unwrap().ping_failures.push_back(failure);
    }

    /// Queue the outcome of the next insert
    pub fn push_insert(&self, outcome: Result<(), WriteFailure>) {
        self.script.lock().unwrap().insert_outcomes.push_back(outcome);
    }

    /// Queue `count` failing inserts of the same kind
    pub fn fail_inserts(&self, count: usize, failure: WriteFailure) {
        for _ in 0..count {
            self.push_insert(Err(failure.clone()));
        }
    }

    /// Make the next insert hang until it is cancelled
    pub fn stall_next_insert(&self) {
        self.script.lock().unwrap().stalled_inserts += 1;
    }

    /// Drop the session of the most recent connection server-side
    pub fn break_connection(&self) {
        let mut script = self.script.lock().unwrap();
        let latest = script.connects;
        script.broken.insert(latest);
    }

    pub fn connects(&self) -> u64 {
        self.script.lock().unwrap().connects
    }

    pub fn pings(&self) -> u64 {
        self.script.lock().unwrap().pings
    }

    pub fn insert_attempts(&self) -> usize {
        self.script.lock().unwrap().inserts.len()
    }

    /// Connection id used by each insert attempt, in order
    pub fn insert_connections(&self) -> Vec<u64> {
        self.script
            .lock()
            .unwrap()
            .inserts
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    /// Payload of each insert attempt, in order
    pub fn insert_payloads(&self) -> Vec<String> {
        self.script
            .lock()
            .unwrap()
            .inserts
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

pub struct ScriptedConnection {
    id: u64,
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnection {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl bb8::ManageConnection for ScriptedConnector {
    type Connection = ScriptedConnection;
    type Error = WriteFailure;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let mut script = self.script.lock().unwrap();
        script.connects += 1;
        if let Some(failure) = script.connect_failures.pop_front() {
            return Err(failure);
        }
        Ok(ScriptedConnection {
            id: script.connects,
            script: Arc::clone(&self.script),
        })
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        let mut script = self.script.lock().unwrap();
        script.pings += 1;
        if script.broken.contains(&conn.id) {
            return Err(session_closed());
        }
        match script.ping_failures.pop_front() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

fn session_closed() -> WriteFailure {
    WriteFailure::new(
        FailureKind::Connection,
        "server closed the connection unexpectedly",
    )
}

#[async_trait]
impl RecordWriter for ScriptedConnection {
    async fn insert_record(&mut self, record: &Record) -> Result<(), WriteFailure> {
        {
            let mut script = self.script.lock().unwrap();
            script
                .inserts
                .push((self.id, record.description().to_string()));
            if script.broken.contains(&self.id) {
                return Err(session_closed());
            }
            if script.stalled_inserts == 0 {
                return script.insert_outcomes.pop_front().unwrap_or(Ok(()));
            }
            script.stalled_inserts -= 1;
        }
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn create_table(&mut self) -> Result<(), WriteFailure> {
        Ok(())
    }
}
