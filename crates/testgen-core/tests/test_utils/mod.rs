//! Fixtures shared by the descriptor engine integration tests

use serde_json::json;
use testgen_core::{ApiDescription, RunConfig};

/// A small pet-location API secured by a query apiKey
pub fn locations_api() -> ApiDescription {
    serde_json::from_value(json!({
        "swagger": "2.0",
        "info": {"title": "Locations", "version": "1.0"},
        "securityDefinitions": {
            "accessToken": {"type": "apiKey", "in": "query", "name": "accessToken"}
        },
        "paths": {
            "/": {
                "post": {
                    "security": [{"accessToken": []}],
                    "parameters": [{
                        "name": "entry",
                        "in": "body",
                        "schema": {"$ref": "#/definitions/Entry"}
                    }],
                    "responses": {
                        "200": {
                            "description": "Success",
                            "schema": {"$ref": "#/definitions/Entry"}
                        }
                    }
                }
            },
            "/{id}/{loc}": {
                "parameters": [
                    {"name": "id", "in": "path", "required": true, "type": "number"},
                    {"name": "loc", "in": "path", "required": true, "type": "number"}
                ],
                "get": {
                    "parameters": [{"name": "id", "in": "query", "type": "number"}],
                    "responses": {"200": {"description": "Success", "schema": {"$ref": "#/definitions/Entry"}}}
                },
                "put": {
                    "parameters": [{"name": "update", "in": "body", "schema": {"properties": {"newId": {"type": "number"}}}}],
                    "responses": {"200": {"description": "Updated", "schema": {"type": "object", "properties": {"id": {"type": "number"}}}}}
                },
                "delete": {
                    "responses": {"200": {"description": "Deleted"}}
                }
            }
        },
        "definitions": {
            "Entry": {
                "type": "object",
                "properties": {"id": {"type": "number"}, "loc": {"type": "number"}}
            }
        }
    }))
    .expect("valid locations description")
}

/// Parse a run configuration from JSON
pub fn config(value: serde_json::Value) -> RunConfig {
    serde_json::from_value(value).expect("valid run configuration")
}
