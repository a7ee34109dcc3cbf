use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use poem::http::{Method, StatusCode};
use poem::{Endpoint, IntoResponse, Middleware, Request, Response, Result};

/// Default attempt budget per client address
pub const LOGIN_ATTEMPT_LIMIT: u32 = 5;

/// Default rolling window
pub const LOGIN_WINDOW: Duration = Duration::from_secs(60);

const LOGIN_PATH_SUFFIX: &str = "/auth/login";

const REJECT_MESSAGE: &str =
    "Too many login attempts from this IP, please try again after a 60 second pause";

/// Sliding-window rate limiter for the login route
///
/// Counts attempts per client address within a rolling window; requests over
/// the budget are rejected with 429 before the handler runs. Responses that
/// pass through carry the standard `RateLimit-*` headers; the legacy
/// `X-RateLimit-*` variants are never emitted.
///
/// The single mutex over the attempt map serializes updates per address, so
/// concurrent attempts from one client cannot undercount.
#[derive(Clone)]
pub struct LoginRateLimiter {
    max_attempts: u32,
    window: Duration,
    clients: Arc<Mutex<HashMap<IpAddr, VecDeque<Instant>>>>,
}

struct Decision {
    allowed: bool,
    remaining: u32,
    reset: Duration,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `addr` and decide whether it may proceed
    fn check(&self, addr: IpAddr, now: Instant) -> Decision {
        let mut clients = self.clients.lock().expect("rate limiter mutex poisoned");

        // Drop attempts that have aged out of the window, and evict
        // addresses with no attempts left so the map does not grow with
        // every client ever seen
        clients.retain(|_, attempts| {
            while let Some(&oldest) = attempts.front() {
                if now.duration_since(oldest) >= self.window {
                    attempts.pop_front();
                } else {
                    break;
                }
            }
            !attempts.is_empty()
        });

        let attempts = clients.entry(addr).or_default();

        let reset = attempts
            .front()
            .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
            .unwrap_or(self.window);

        if attempts.len() as u32 >= self.max_attempts {
            return Decision {
                allowed: false,
                remaining: 0,
                reset,
            };
        }

        attempts.push_back(now);
        Decision {
            allowed: true,
            remaining: self.max_attempts - attempts.len() as u32,
            reset,
        }
    }

    fn apply_headers(&self, mut resp: Response, decision: &Decision) -> Response {
        let headers = resp.headers_mut();
        headers.insert("RateLimit-Limit", self.max_attempts.into());
        headers.insert("RateLimit-Remaining", decision.remaining.into());
        let reset_secs = decision.reset.as_secs_f64().ceil() as u64;
        headers.insert("RateLimit-Reset", reset_secs.into());
        resp
    }
}

impl<E: Endpoint> Middleware<E> for LoginRateLimiter {
    type Output = LoginRateLimiterEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        LoginRateLimiterEndpoint {
            ep,
            limiter: self.clone(),
        }
    }
}

pub struct LoginRateLimiterEndpoint<E> {
    ep: E,
    limiter: LoginRateLimiter,
}

impl<E: Endpoint> Endpoint for LoginRateLimiterEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> Result<Self::Output> {
        let is_login = req.method() == Method::POST && req.uri().path().ends_with(LOGIN_PATH_SUFFIX);
        if !is_login {
            return Ok(self.ep.call(req).await?.into_response());
        }

        let Some(addr) = client_addr(&req) else {
            // No resolvable client address, nothing to key the counter on
            return Ok(self.ep.call(req).await?.into_response());
        };

        let decision = self.limiter.check(addr, Instant::now());
        if decision.allowed {
            let resp = self.ep.call(req).await?.into_response();
            return Ok(self.limiter.apply_headers(resp, &decision));
        }

        tracing::warn!(client = %addr, path = %req.uri().path(), "Login rate limit exceeded");

        let body = serde_json::json!({ "message": REJECT_MESSAGE }).to_string();
        let resp = Response::builder()
            .status(StatusCode::TOO_MANY_REQUESTS)
            .content_type("application/json")
            .body(body);
        Ok(self.limiter.apply_headers(resp, &decision))
    }
}

/// Resolve the client address for rate limiting
///
/// Checks proxy headers before falling back to the socket peer address.
fn client_addr(req: &Request) -> Option<IpAddr> {
    // Check X-Forwarded-For header (proxy/load balancer)
    if let Some(forwarded) = req.header("X-Forwarded-For") {
        if let Some(ip) = forwarded.split(',').next() {
            if let Ok(ip) = ip.trim().parse() {
                return Some(ip);
            }
        }
    }

    // Check X-Real-IP header (nginx)
    if let Some(real_ip) = req.header("X-Real-IP") {
        if let Ok(ip) = real_ip.parse() {
            return Some(ip);
        }
    }

    // Fall back to remote address
    req.remote_addr().as_socket_addr().map(|addr| addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> IpAddr {
        s.parse().expect("bad test address")
    }

    #[test]
    fn test_attempts_within_budget_are_allowed() {
        let limiter = LoginRateLimiter::new(5, Duration::from_secs(60));
        let now = Instant::now();

        for i in 0..5 {
            let decision = limiter.check(addr("10.0.0.1"), now);
            assert!(decision.allowed, "attempt {} should be allowed", i + 1);
            assert_eq!(decision.remaining, 4 - i);
        }
    }

    #[test]
    fn test_sixth_attempt_in_window_is_rejected() {
        let limiter = LoginRateLimiter::new(5, Duration::from_secs(60));
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check(addr("10.0.0.1"), now).allowed);
        }

        let sixth = limiter.check(addr("10.0.0.1"), now);
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
        assert!(sixth.reset <= Duration::from_secs(60));

        // Still rejected on further attempts
        assert!(!limiter.check(addr("10.0.0.1"), now).allowed);
    }

    #[test]
    fn test_window_slides() {
        let window = Duration::from_secs(60);
        let limiter = LoginRateLimiter::new(5, window);
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check(addr("10.0.0.1"), start).allowed);
        }
        assert!(!limiter.check(addr("10.0.0.1"), start).allowed);

        // Once the first attempts age out, the budget frees up again
        let later = start + window + Duration::from_secs(1);
        assert!(limiter.check(addr("10.0.0.1"), later).allowed);
    }

    #[test]
    fn test_addresses_are_counted_independently() {
        let limiter = LoginRateLimiter::new(5, Duration::from_secs(60));
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check(addr("10.0.0.1"), now).allowed);
        }
        assert!(!limiter.check(addr("10.0.0.1"), now).allowed);

        // A different client is unaffected
        assert!(limiter.check(addr("10.0.0.2"), now).allowed);
    }

    #[test]
    fn test_idle_addresses_are_evicted() {
        let window = Duration::from_secs(60);
        let limiter = LoginRateLimiter::new(5, window);
        let start = Instant::now();

        limiter.check(addr("10.0.0.1"), start);
        limiter.check(addr("10.0.0.2"), start);

        // A later attempt from one client sweeps out the other's stale entry
        let later = start + window + Duration::from_secs(1);
        limiter.check(addr("10.0.0.2"), later);

        let clients = limiter.clients.lock().unwrap();
        assert!(!clients.contains_key(&addr("10.0.0.1")));
        assert!(clients.contains_key(&addr("10.0.0.2")));
    }

    #[test]
    fn test_partial_expiry_frees_only_expired_attempts() {
        let window = Duration::from_secs(60);
        let limiter = LoginRateLimiter::new(5, window);
        let start = Instant::now();

        // Two early attempts, then three later ones fill the budget
        limiter.check(addr("10.0.0.1"), start);
        limiter.check(addr("10.0.0.1"), start);
        let mid = start + Duration::from_secs(30);
        for _ in 0..3 {
            assert!(limiter.check(addr("10.0.0.1"), mid).allowed);
        }
        assert!(!limiter.check(addr("10.0.0.1"), mid).allowed);

        // After the early attempts age out there is room for exactly two more
        let later = start + window + Duration::from_secs(1);
        assert!(limiter.check(addr("10.0.0.1"), later).allowed);
        assert!(limiter.check(addr("10.0.0.1"), later).allowed);
        assert!(!limiter.check(addr("10.0.0.1"), later).allowed);
    }
}
