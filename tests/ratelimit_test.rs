// Integration tests for the fixed-window rate limiter

use std::time::Duration;

use solace::ratelimit::RateLimiter;

#[test]
fn test_window_law() {
    let limiter = RateLimiter::default();
    let window = Duration::from_secs(60);

    // First N calls succeed with remaining counting down, the (N+1)-th fails.
    let limit = 3;
    for expected_remaining in (0..limit).rev() {
        let decision = limiter.check("user-1", limit, window);
        assert!(decision.success);
        assert_eq!(decision.remaining, expected_remaining);
    }

    let rejected = limiter.check("user-1", limit, window);
    assert!(!rejected.success);
    assert_eq!(rejected.remaining, 0);
}

#[tokio::test]
async fn test_reset_law() {
    let limiter = RateLimiter::default();
    let window = Duration::from_millis(100);

    assert!(limiter.check("user-2", 1, window).success);
    assert!(!limiter.check("user-2", 1, window).success);

    tokio::time::sleep(Duration::from_millis(150)).await;

    // Behaves as a first call again after the window has passed.
    let fresh = limiter.check("user-2", 1, window);
    assert!(fresh.success);
    assert_eq!(fresh.remaining, 0);
}

#[test]
fn test_independence_law() {
    let limiter = RateLimiter::default();
    let window = Duration::from_secs(60);

    for _ in 0..5 {
        limiter.check("user-a", 2, window);
    }

    let b = limiter.check("user-b", 2, window);
    assert!(b.success);
    assert_eq!(b.remaining, 1);
}

#[tokio::test]
async fn test_sweeper_lifecycle() {
    let limiter = RateLimiter::new(Duration::from_millis(50));
    limiter.start();

    limiter.check("ephemeral", 3, Duration::from_millis(20));
    limiter.check("sticky", 3, Duration::from_secs(60));

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(limiter.tracked_count(), 1);
    limiter.stop();
}
