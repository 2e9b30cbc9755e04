//! Benchmarks for schema ingestion, extraction and cloning
//!
//! Copyright (c) 2025 Fieldmodel Team
//! Licensed under the Apache-2.0 license

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fieldmodel_core::{fields, Field, Model, Primitive, Schema, SchemaOptions};
use serde_json::{json, Value};

fn friend_schema() -> Schema {
    Schema::define(
        fields! {
            "id" => "user_id",
            "name" => Field::keyed("user_name").model(Primitive::Text),
        },
        SchemaOptions::new().name("Friend"),
    )
}

fn user_schema() -> Schema {
    let friend = friend_schema();
    Schema::define(
        fields! {
            "id" => "user_id",
            "name" => Field::keyed("user_name").default_value(""),
            "age" => Field::keyed("user_age").model(Primitive::Number),
            "joined" => Field::keyed("joined_at").model(Primitive::Timestamp),
            "tags" => Field::keyed("user_tags").model(Model::sequence_of(Primitive::Text)),
            "friends" => Field::keyed("friends").model(Model::sequence_of(&friend)),
        },
        SchemaOptions::new().name("User"),
    )
}

fn create_user(friends: usize) -> Value {
    let friends: Vec<Value> = (0..friends)
        .map(|i| json!({"user_id": i, "user_name": format!("Friend {}", i)}))
        .collect();
    json!({
        "user_id": 1,
        "user_name": "Ada",
        "user_age": "36",
        "joined_at": "2024-03-01T12:00:00Z",
        "user_tags": ["math", "engines", "poetry"],
        "friends": friends,
    })
}

fn bench_parse(c: &mut Criterion) {
    let schema = user_schema();
    let mut group = c.benchmark_group("parse");

    for size in [0usize, 10, 100] {
        let raw = create_user(size);
        group.bench_with_input(BenchmarkId::new("friends", size), &raw, |b, raw| {
            b.iter(|| schema.parse(black_box(raw.clone())))
        });
    }
    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let schema = user_schema();
    let mut group = c.benchmark_group("convert");

    for size in [0usize, 10, 100] {
        let instance = schema.parse(create_user(size)).expect("parse");
        group.bench_with_input(BenchmarkId::new("friends", size), &instance, |b, instance| {
            b.iter(|| schema.convert(black_box(instance)))
        });
    }
    group.finish();
}

fn bench_clone(c: &mut Criterion) {
    let schema = user_schema();
    let instance = schema.parse(create_user(50)).expect("parse");

    c.bench_function("clone_declared_keys", |b| {
        b.iter(|| schema.clone_instance(black_box(&instance), false))
    });
    c.bench_function("clone_all_keys", |b| {
        b.iter(|| schema.clone_instance(black_box(&instance), true))
    });
}

criterion_group!(benches, bench_parse, bench_convert, bench_clone);
criterion_main!(benches);
