//! Bridges the client's observables to the UI loop.
//!
//! The main loop calls [`Feed::issue`] to start a request and
//! [`Feed::try_recv`] once per tick.  Nothing here blocks: the request runs on
//! the client's worker tasks and the observable is only peeked at.

use std::sync::Arc;

use dove_news::{Article, NewsApiClient, Observable, Source, Specification};

/// What the viewer was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Headlines(Specification),
    Search(String),
    Sources(Specification),
}

impl Request {
    /// Border title for the list.
    pub fn label(&self) -> String {
        match self {
            Request::Headlines(spec) => format!(" Headlines: {} / {} ", spec.category, spec.country),
            Request::Search(query) => format!(" Search: {query} "),
            Request::Sources(spec) => format!(" Sources: {} ", spec.category),
        }
    }
}

/// A completed response.
pub enum FeedMsg {
    Articles(Arc<Vec<Article>>),
    Sources(Arc<Vec<Source>>),
}

enum Pending {
    Articles(Observable<Vec<Article>>),
    Sources(Observable<Vec<Source>>),
}

pub struct Feed {
    client: Arc<NewsApiClient>,
    request: Request,
    pending: Option<Pending>,
}

impl Feed {
    pub fn new(client: Arc<NewsApiClient>, request: Request) -> Self {
        Self {
            client,
            request,
            pending: None,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Start (or restart) the request.  An unanswered earlier one is dropped.
    pub fn issue(&mut self) {
        let pending = match &self.request {
            Request::Headlines(spec) => Pending::Articles(self.client.get_headlines(spec)),
            Request::Search(query) => Pending::Articles(self.client.get_search_for_news(query)),
            Request::Sources(spec) => Pending::Sources(self.client.get_sources(spec)),
        };
        self.pending = Some(pending);
    }

    /// Take the response if it has arrived.
    pub fn try_recv(&mut self) -> Option<FeedMsg> {
        let msg = match self.pending.as_ref()? {
            Pending::Articles(observable) => observable.get().map(FeedMsg::Articles),
            Pending::Sources(observable) => observable.get().map(FeedMsg::Sources),
        };
        if msg.is_some() {
            self.pending = None;
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_describe_the_request() {
        let spec = Specification::new("science", "gb", "k");
        assert_eq!(
            Request::Headlines(spec.clone()).label(),
            " Headlines: science / gb "
        );
        assert_eq!(Request::Search("rust".into()).label(), " Search: rust ");
        assert_eq!(Request::Sources(spec).label(), " Sources: science ");
    }
}
