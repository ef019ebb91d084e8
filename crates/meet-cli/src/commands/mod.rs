//! CLI subcommand implementations.

pub mod competitions;
pub mod edit;
pub mod import;
pub mod lifecycle;
pub mod load;
pub mod results;
pub mod time;
pub mod util;

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use crate::Config;
    use crate::commands::load::{self, LoadArgs};

    /// Two athletes and one scheduled competition with an individual and a relay event.
    pub const FIXTURE: &str = r#"{
        "athletes": [
            {"id": "ath-joao", "name": "João Silva", "category": "Master"},
            {"id": "ath-ana", "name": "Ana Costa", "category": "Master"}
        ],
        "competitions": [
            {
                "id": "comp-1",
                "name": "Torneio Regional",
                "location": "Piscina Municipal",
                "date": "2026-03-14",
                "category": "Master",
                "registered_athletes": ["ath-joao", "ath-ana"],
                "events": [
                    {
                        "id": "ev-100-free",
                        "name": "100m Livre",
                        "stage": "Final",
                        "kind": "individual",
                        "heats": [
                            {"id": "heat-1", "number": 1, "entries": [
                                {"lane": 4, "athlete_id": "ath-joao"},
                                {"lane": 5, "athlete_id": "ath-ana"}
                            ]}
                        ]
                    },
                    {
                        "id": "ev-relay",
                        "name": "4x50m Livre",
                        "kind": "relay",
                        "heats": [
                            {"id": "relay-1", "number": 1, "entries": [
                                {"lane": 3, "relay_athletes": ["ath-joao", "ath-ana"]}
                            ]}
                        ]
                    }
                ]
            }
        ]
    }"#;

    pub fn config_in(dir: &Path) -> Config {
        Config {
            database_path: dir.join("meet.db"),
            ..Config::default()
        }
    }

    /// A config whose database already holds [`FIXTURE`].
    pub fn seeded(dir: &Path) -> Config {
        let config = config_in(dir);
        let file = dir.join("fixture.json");
        std::fs::write(&file, FIXTURE).unwrap();
        load::run(&mut Vec::new(), &LoadArgs { file }, &config).unwrap();
        config
    }
}
