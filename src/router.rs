//! Route table and dispatch.
//!
//! Routes are matched in the order they were added. A route matches on exact
//! path equality and, if it has one, the method. The first match handles the
//! request, no match is answered with a plain 404.

use http::Method;

use crate::{Error, Page, Request, Responder, Result};

/// Something that answers a request.
///
/// A handler must send exactly one response through the [`Responder`] before
/// returning `Ok`. Plain functions with the matching signature are handlers:
///
/// ```
/// use wisp::{Request, Responder, Result, Router};
///
/// fn status(res: &mut Responder<'_>, _req: &Request<'_>) -> Result<()> {
///     res.ok("application/json", br#"{"up":true}"#)
/// }
///
/// let router = Router::new().get("/status", status);
/// assert_eq!(router.len(), 1);
/// ```
pub trait Handler {
    fn call(&self, res: &mut Responder<'_>, req: &Request<'_>) -> Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&mut Responder<'_>, &Request<'_>) -> Result<()>,
{
    fn call(&self, res: &mut Responder<'_>, req: &Request<'_>) -> Result<()> {
        (self)(res, req)
    }
}

/// One row of the route table.
pub struct Route {
    path: String,
    method: Option<Method>,
    handler: Box<dyn Handler>,
}

impl Route {
    /// `method` of `None` matches any method.
    pub fn new(path: &str, method: Option<Method>, handler: impl Handler + 'static) -> Self {
        Route {
            path: path.to_string(),
            method,
            handler: Box::new(handler),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    fn matches(&self, req: &Request<'_>) -> bool {
        if req.path() != self.path {
            return false;
        }

        match &self.method {
            Some(m) => m.as_str() == req.method(),
            None => true,
        }
    }
}

/// Outcome of [`Router::dispatch`] that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    /// No route matched, a 404 was sent.
    NotFound,
}

/// Ordered route table. Built up front, not modified while serving.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Router::default()
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn get(self, path: &str, handler: impl Handler + 'static) -> Self {
        self.route(Route::new(path, Some(Method::GET), handler))
    }

    pub fn post(self, path: &str, handler: impl Handler + 'static) -> Self {
        self.route(Route::new(path, Some(Method::POST), handler))
    }

    /// Route `path` for every method.
    pub fn any(self, path: &str, handler: impl Handler + 'static) -> Self {
        self.route(Route::new(path, None, handler))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Run the first matching handler, or answer 404.
    ///
    /// A handler that returns `Ok` without having responded is an error,
    /// [`Error::NoResponse`].
    pub fn dispatch(&self, res: &mut Responder<'_>, req: &Request<'_>) -> Result<Dispatch> {
        let Some(route) = self.routes.iter().find(|r| r.matches(req)) else {
            debug!("No route for {} {}", req.method(), req.path());
            res.not_found()?;
            return Ok(Dispatch::NotFound);
        };

        debug!(
            "Route {} {}",
            route.method.as_ref().map(|m| m.as_str()).unwrap_or("*"),
            route.path
        );

        route.handler.call(res, req)?;

        if !res.has_responded() {
            return Err(Error::NoResponse);
        }

        Ok(Dispatch::Handled)
    }
}

/// Answers any request with a page showing its method, path and query.
pub fn echo(res: &mut Responder<'_>, req: &Request<'_>) -> Result<()> {
    let mut page = Page::new("wisp");
    page.paragraph(&format!("Method: {}", req.method()))
        .paragraph(&format!("Path: {}", req.path()))
        .paragraph(&format!("Query: {}", req.query()));
    page.finish(res)
}

#[cfg(test)]
mod test {
    use super::*;

    fn h1(res: &mut Responder<'_>, _req: &Request<'_>) -> Result<()> {
        res.ok("text/plain", b"h1")
    }

    fn h2(res: &mut Responder<'_>, _req: &Request<'_>) -> Result<()> {
        res.ok("text/plain", b"h2")
    }

    fn run(router: &Router, input: &[u8]) -> Result<(Dispatch, Vec<u8>)> {
        let req = Request::from_bytes(input)?;
        let mut out = Vec::new();
        let mut hbuf = [0; 256];
        let mut res = Responder::new(&mut out, &mut hbuf);
        let d = router.dispatch(&mut res, &req)?;
        Ok((d, out))
    }

    #[test]
    fn method_selects_handler() -> Result<()> {
        let router = Router::new().get("/", h1).post("/", h2);

        let (d, out) = run(&router, b"GET / HTTP/1.1\r\n\r\n")?;
        assert_eq!(d, Dispatch::Handled);
        assert!(out.ends_with(b"\r\n\r\nh1"));

        let (d, out) = run(&router, b"POST / HTTP/1.1\r\nContent-Length: 0\r\n\r\n")?;
        assert_eq!(d, Dispatch::Handled);
        assert!(out.ends_with(b"\r\n\r\nh2"));

        let (d, out) = run(&router, b"GET /nope HTTP/1.1\r\n\r\n")?;
        assert_eq!(d, Dispatch::NotFound);
        assert!(out.starts_with(b"HTTP/1.1 404 Not Found\r\n"));
        assert!(out.ends_with(b"404 Not Found\r\n"));

        // Method mismatch on a known path is a miss too.
        let (d, _) = run(&router, b"PUT / HTTP/1.1\r\n\r\n")?;
        assert_eq!(d, Dispatch::NotFound);
        Ok(())
    }

    #[test]
    fn first_match_wins() -> Result<()> {
        let router = Router::new().any("/x", h1).get("/x", h2);
        let (_, out) = run(&router, b"GET /x HTTP/1.1\r\n\r\n")?;
        assert!(out.ends_with(b"h1"));
        Ok(())
    }

    #[test]
    fn exact_path_only() -> Result<()> {
        let router = Router::new().any("/a", h1);
        for input in [&b"GET /a/ HTTP/1.1\r\n\r\n"[..], b"GET /ab HTTP/1.1\r\n\r\n"] {
            let (d, _) = run(&router, input)?;
            assert_eq!(d, Dispatch::NotFound);
        }
        // Query does not take part in matching.
        let (d, _) = run(&router, b"GET /a?z=1 HTTP/1.1\r\n\r\n")?;
        assert_eq!(d, Dispatch::Handled);
        Ok(())
    }

    fn silent(_res: &mut Responder<'_>, _req: &Request<'_>) -> Result<()> {
        Ok(())
    }

    fn busy(_res: &mut Responder<'_>, _req: &Request<'_>) -> Result<()> {
        Err(Error::Handler("flash busy"))
    }

    #[test]
    fn silent_handler_is_error() {
        let router = Router::new().get("/", silent);
        assert!(matches!(
            run(&router, b"GET / HTTP/1.1\r\n\r\n"),
            Err(Error::NoResponse)
        ));
    }

    #[test]
    fn handler_error_propagates() {
        let router = Router::new().get("/", busy);
        assert!(matches!(
            run(&router, b"GET / HTTP/1.1\r\n\r\n"),
            Err(Error::Handler("flash busy"))
        ));
    }

    #[test]
    fn echo_page() -> Result<()> {
        let router = Router::new().any("/e", echo);
        let (_, out) = run(&router, b"DELETE /e?k=<v> HTTP/1.1\r\n\r\n")?;
        let s = String::from_utf8_lossy(&out);
        assert!(s.contains("<p>Method: DELETE</p>"));
        assert!(s.contains("<p>Query: k=&lt;v&gt;</p>"));
        Ok(())
    }
}
