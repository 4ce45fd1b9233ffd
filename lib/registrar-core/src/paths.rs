//! Store key layout for vulcand backends, frontends and servers
//!
//! ```text
//! <prefix>/backends/<name>/backend
//! <prefix>/backends/<name>/servers/<id>
//! <prefix>/frontends/<name>/frontend
//! ```
//!
//! Names and ids are used verbatim.

pub fn backend_path(prefix: &str, name: &str) -> String {
    format!("{}/backends/{}/backend", prefix, name)
}

pub fn frontend_path(prefix: &str, name: &str) -> String {
    format!("{}/frontends/{}/frontend", prefix, name)
}

pub fn server_path(prefix: &str, name: &str, id: &str) -> String {
    format!("{}/backends/{}/servers/{}", prefix, name, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(backend_path("/vulcand", "web"), "/vulcand/backends/web/backend");
        assert_eq!(frontend_path("/vulcand", "web"), "/vulcand/frontends/web/frontend");
        assert_eq!(server_path("/vulcand", "web", "i1"), "/vulcand/backends/web/servers/i1");
    }

    #[test]
    fn test_empty_prefix() {
        assert_eq!(backend_path("", "web"), "/backends/web/backend");
        assert_eq!(server_path("", "web", "i1"), "/backends/web/servers/i1");
    }

    #[test]
    fn test_paths_are_stable() {
        assert_eq!(server_path("/v", "api", "a"), server_path("/v", "api", "a"));
        assert_eq!(frontend_path("/v", "api"), frontend_path("/v", "api"));
    }

    #[test]
    fn test_paths_disjoint_across_services_and_instances() {
        let prefix = "/vulcand";
        let paths = [
            backend_path(prefix, "web"),
            frontend_path(prefix, "web"),
            server_path(prefix, "web", "i1"),
            server_path(prefix, "web", "i2"),
            backend_path(prefix, "web2"),
            frontend_path(prefix, "web2"),
            server_path(prefix, "web2", "i1"),
        ];

        for (i, a) in paths.iter().enumerate() {
            for (j, b) in paths.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                    // No path may sit underneath another one
                    assert!(!b.starts_with(&format!("{}/", a)), "{} contains {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_server_path_is_under_backend_tree() {
        let backend_dir = "/vulcand/backends/web/";
        assert!(server_path("/vulcand", "web", "i1").starts_with(backend_dir));
        assert!(!frontend_path("/vulcand", "web").starts_with(backend_dir));
    }
}
