//! Seeded synthetic datasets shared by the integration tests.
#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Point {
    pub x1: f32,
    pub x2: f32,
    pub label: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct House {
    pub size: f32,
    pub rooms: f32,
    pub price: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flower {
    pub a: f32,
    pub b: f32,
    pub species: String,
}

fn rng(seed: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Two gaussian-ish blobs, positive around (2, 2), negative around (-2, -2).
pub fn points(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = rng(seed);
    (0..n)
        .map(|i| {
            let label = i % 2 == 0;
            let center = if label { 2.0 } else { -2.0 };
            Point {
                x1: center + rng.gen_range(-1.5..1.5),
                x2: center + rng.gen_range(-1.5..1.5),
                label,
            }
        })
        .collect()
}

/// price = 3 * size + 2 * rooms + 5, plus a little noise.
pub fn houses(n: usize, seed: u64) -> Vec<House> {
    let mut rng = rng(seed);
    (0..n)
        .map(|_| {
            let size = rng.gen_range(0.0..10.0);
            let rooms = rng.gen_range(1.0..6.0f32).round();
            House {
                size,
                rooms,
                price: 3.0 * size + 2.0 * rooms + 5.0 + rng.gen_range(-0.1..0.1),
            }
        })
        .collect()
}

/// Three well separated species.
pub fn flowers(n: usize, seed: u64) -> Vec<Flower> {
    let mut rng = rng(seed);
    let species = [
        ("setosa", 0.0, 0.0),
        ("versicolor", 5.0, 0.0),
        ("virginica", 0.0, 5.0),
    ];
    (0..n)
        .map(|i| {
            let (name, a, b) = species[i % species.len()];
            Flower {
                a: a + rng.gen_range(-1.0..1.0),
                b: b + rng.gen_range(-1.0..1.0),
                species: name.to_string(),
            }
        })
        .collect()
}
