use std::{
    sync::mpsc::{self, Receiver, SyncSender, TrySendError},
    thread::{self, JoinHandle},
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{client::CatalogClient, models::Movie};

pub const REQUEST_CAPACITY: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    Fetch { limit: u64, skip: u64 },
    Add(Movie),
    Update(i32, Movie),
    Delete(i32),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Movies(Vec<Movie>),
    /// Acknowledgement text of a successful mutation.
    Ack(String),
    Failed(String),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Too many pending requests.")]
    Busy,
    #[error("The request worker has stopped.")]
    Stopped,
}

/// One background thread that owns the blocking client.
pub struct Worker {
    requests: SyncSender<Request>,
    responses: Receiver<Response>,
    handle: JoinHandle<()>,
}

impl Worker {
    pub fn spawn(client: CatalogClient, capacity: usize) -> std::io::Result<Self> {
        let (requests, inbox) = mpsc::sync_channel(capacity);
        let (outbox, responses) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("catalog-worker".to_string())
            .spawn(move || run(client, inbox, outbox))?;

        Ok(Self { requests, responses, handle })
    }

    pub fn submit(&self, request: Request) -> Result<(), SubmitError> {
        self.requests.try_send(request).map_err(|err| match err {
            TrySendError::Full(_) => SubmitError::Busy,
            TrySendError::Disconnected(_) => SubmitError::Stopped,
        })
    }

    pub fn try_recv(&self) -> Option<Response> {
        self.responses.try_recv().ok()
    }

    /// Closes the request channel and waits for the in-flight request, if any.
    pub fn shutdown(self) {
        drop(self.requests);
        if self.handle.join().is_err() {
            warn!("catalog worker panicked");
        }
    }
}

fn run(client: CatalogClient, inbox: Receiver<Request>, outbox: mpsc::Sender<Response>) {
    for request in inbox {
        let response = execute(&client, request);
        if outbox.send(response).is_err() {
            break;
        }
    }
    debug!("catalog worker stopped");
}

pub fn execute(client: &CatalogClient, request: Request) -> Response {
    debug!(?request, "sending request");
    let outcome = match request {
        Request::Fetch { limit, skip } => client.list_movies(limit, skip).map(Response::Movies),
        Request::Add(movie) => client.add_movie(&movie).map(Response::Ack),
        Request::Update(id, movie) => client.update_movie(id, &movie).map(Response::Ack),
        Request::Delete(id) => client.delete_movie(id).map(Response::Ack),
    };
    outcome.unwrap_or_else(|err| {
        warn!(error = %err, "request failed");
        Response::Failed(err.to_string())
    })
}
