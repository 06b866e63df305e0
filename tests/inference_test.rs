//! End-to-end tests for schema inference over examples and documents.

use openapi_infer::schema::{sniff, Format, SchemaInferrer, SchemaRegistry};
use openapi_infer::{infer_document, InferConfig, SchemaFragment};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn infer_all(examples: &[(&str, Value)]) -> (Vec<SchemaFragment>, SchemaRegistry) {
    let mut registry = SchemaRegistry::new();
    let mut inferrer = SchemaInferrer::new(&mut registry);
    let fragments = examples
        .iter()
        .map(|(key, value)| inferrer.infer(value, key))
        .collect();
    (fragments, registry)
}

mod format_priority {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn uuid_is_never_plain_or_uri() {
        assert_eq!(sniff("123e4567-e89b-12d3-a456-426614174000"), Some(Format::Uuid));
    }

    #[test]
    fn calendar_formats() {
        assert_eq!(sniff("2024-01-31"), Some(Format::Date));
        assert_eq!(sniff("2024-01-31T10:00:00Z"), Some(Format::DateTime));
    }
}

mod registry_evolution {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collision_escalation_through_inference() {
        let (fragments, registry) = infer_all(&[
            ("user", json!({"id": 1})),
            ("user", json!({"name": "Alice"})),
            ("user", json!({"id": 2})),
        ]);

        let names: Vec<_> = fragments.iter().filter_map(SchemaFragment::reference_name).collect();
        assert_eq!(names, vec!["user", "user1", "user"]);
        assert!(!registry.contains("user2"));
    }

    #[test]
    fn nested_references_split_parents() {
        let (fragments, registry) = infer_all(&[
            ("repo", json!({"name": "a", "owner": {"login": "octo"}})),
            ("repo", json!({"name": "b", "owner": {"slug": "org"}})),
        ]);

        assert_eq!(fragments[0], SchemaFragment::reference("repo"));
        assert_eq!(fragments[1], SchemaFragment::reference("repo1"));
        assert_eq!(
            registry.to_components(),
            json!({
                "owner": {"type": "object", "properties": {"login": {"type": "string"}}},
                "repo": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "owner": {"$ref": "#/components/schemas/owner"}
                    }
                },
                "owner1": {"type": "object", "properties": {"slug": {"type": "string"}}},
                "repo1": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "owner": {"$ref": "#/components/schemas/owner1"}
                    }
                }
            })
        );
    }

    #[test]
    fn array_of_heterogeneous_objects() {
        let (fragments, registry) = infer_all(&[(
            "orders",
            json!([
                {"id": 1, "placed_at": "2024-01-31T10:00:00Z"},
                {"id": 2, "placed_at": "2024-02-01T09:30:00Z", "note": "gift"}
            ]),
        )]);

        assert_eq!(
            fragments[0].to_value(),
            json!({"type": "array", "items": {"$ref": "#/components/schemas/order"}})
        );
        assert_eq!(
            registry.get("order").unwrap().to_value(),
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer"},
                    "placed_at": {"type": "string", "format": "date-time"},
                    "note": {"type": "string"}
                }
            })
        );
    }

    #[test]
    fn absorb_isolated_worker_registries() {
        let (_, mut main) = infer_all(&[("user", json!({"id": 1, "email": "a@b.io"}))]);
        let (_, worker) = infer_all(&[
            ("user", json!({"id": 2})),
            ("user", json!({"handle": "x"})),
        ]);

        let renames = main.absorb(worker);
        assert_eq!(renames.get("user").map(String::as_str), Some("user"));
        assert_eq!(renames.get("user1").map(String::as_str), Some("user1"));
        assert!(main.get("user").unwrap().get("email").unwrap().nullable);
    }

    #[test]
    fn awkward_property_names_survive_a_reseed() {
        let (_, registry) = infer_all(&[(
            "resource",
            json!({"links/self": {"href": "https://example.com/r/1"}, "x~y": {"id": 1}, "": {"id": "a"}}),
        )]);

        let components = registry.to_components();
        let properties = &components["resource"]["properties"];
        assert_eq!(properties["links/self"], json!({"$ref": "#/components/schemas/links~1self"}));
        assert_eq!(properties["x~y"], json!({"$ref": "#/components/schemas/x~0y"}));
        assert_eq!(properties[""], json!({"$ref": "#/components/schemas/"}));

        let reseeded = SchemaRegistry::from_components(&components).unwrap();
        assert_eq!(reseeded.to_components(), components);
        for name in ["links/self", "x~y", ""] {
            assert!(reseeded.contains(name), "missing {name:?}");
        }
    }
}

mod documents {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shared_shapes_across_endpoints() {
        let mut document = json!({
            "openapi": "3.0.3",
            "paths": {
                "/users": {
                    "get": {
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {
                                        "example": {"users": [{"id": 1, "profile": {"bio": "hi"}}]}
                                    }
                                }
                            }
                        }
                    }
                },
                "/users/{id}": {
                    "get": {
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": {
                                        "example": {"id": 1, "profile": {"bio": "hi", "site": "https://x.dev"}}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });

        let report = infer_document(&mut document, &InferConfig::default()).unwrap();
        assert_eq!(report.inferred.len(), 2);
        assert_eq!(report.inferred[0].key, "users_get_200_response");

        let schemas = &document["components"]["schemas"];
        assert_eq!(
            schemas["profile"],
            json!({
                "type": "object",
                "properties": {
                    "bio": {"type": "string"},
                    "site": {"type": "string", "format": "uri", "nullable": true}
                }
            })
        );
        assert_eq!(
            schemas["users_get_200_response"]["properties"]["users"],
            json!({"type": "array", "items": {"$ref": "#/components/schemas/user"}})
        );
        assert_eq!(
            schemas["user"]["properties"]["profile"],
            json!({"$ref": "#/components/schemas/profile"})
        );
    }
}
