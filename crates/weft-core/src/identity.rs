use rand::Rng;
use serde::{Deserialize, Serialize};

/// One author identity. Immutable after plan load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// `Name <email>`, as git renders an author.
    pub fn signature(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

/// Fixed, ordered pool of author identities.
///
/// Plan validation guarantees at least one entry, so the accessors below may
/// index without checking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityPool(Vec<Identity>);

impl IdentityPool {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self(identities)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first entry. Authors the initial trunk commit and the terminal
    /// release commit.
    pub fn lead(&self) -> &Identity {
        &self.0[0]
    }

    /// Select by caller-supplied key, wrapping past the end of the pool.
    pub fn get(&self, key: usize) -> &Identity {
        &self.0[key % self.0.len()]
    }

    /// Uniform draw from the pool.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> &Identity {
        &self.0[rng.gen_range(0..self.0.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool() -> IdentityPool {
        IdentityPool::new(vec![
            Identity {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
            Identity {
                name: "Brin".into(),
                email: "brin@example.com".into(),
            },
        ])
    }

    #[test]
    fn lead_is_first_entry() {
        assert_eq!(pool().lead().name, "Ada");
    }

    #[test]
    fn get_wraps_past_pool_end() {
        let p = pool();
        assert_eq!(p.get(0).name, "Ada");
        assert_eq!(p.get(1).name, "Brin");
        assert_eq!(p.get(2).name, "Ada");
        assert_eq!(p.get(7).name, "Brin");
    }

    #[test]
    fn choose_stays_in_pool() {
        let p = pool();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let id = p.choose(&mut rng);
            assert!(id.name == "Ada" || id.name == "Brin");
        }
    }

    #[test]
    fn signature_matches_git_form() {
        assert_eq!(pool().lead().signature(), "Ada <ada@example.com>");
    }
}
