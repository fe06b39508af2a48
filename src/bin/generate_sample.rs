//! Writes two sample sheet exports matching the published-feed schemas,
//! for offline use via File → Open CSV….

use std::io::Write;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform jitter in [1 - spread, 1 + spread].
    fn jitter(&mut self, spread: f64) -> f64 {
        1.0 + (self.next_f64() * 2.0 - 1.0) * spread
    }
}

struct Amphora {
    name: &'static str,
    mass_empty: f64,
    mass_wine: f64,
    mass_oil: f64,
    volume: f64,
    tensile: f64,
}

const AMPHORAE: [Amphora; 4] = [
    Amphora { name: "Dressel_20", mass_empty: 2.5, mass_wine: 27.0, mass_oil: 25.3, volume: 2.45e7, tensile: 2.03 },
    Amphora { name: "Greco_Italic", mass_empty: 1.9, mass_wine: 22.1, mass_oil: 20.8, volume: 2.02e7, tensile: 21.03 },
    Amphora { name: "Bozburun", mass_empty: 2.2, mass_wine: 24.6, mass_oil: 23.1, volume: 2.24e7, tensile: 32.11 },
    Amphora { name: "RA_4", mass_empty: 1.6, mass_wine: 18.9, mass_oil: 17.7, volume: 1.73e7, tensile: 56.22 },
];

fn main() {
    let mut rng = SimpleRng::new(42);

    let mut stack = String::from(
        "Amphorae,Test,Mass (Empty) (kg),Mass (Wine) (kg),Mass (Oil) (kg),\
         Internal Volume (mm^3),w (# pot),l (# pot),n (layers),Load (N),\
         Max Tensile (MPa),Max Compressive (MPa),Factor of Safety\n",
    );
    for amp in &AMPHORAE {
        for (suffix, test, w, l, n) in [
            ("rect", "Stack Rect", 4, 5, 3),
            ("hex", "Stack Hex", 4, 5, 3),
        ] {
            let load = 180.0 * amp.mass_wine * rng.jitter(0.1);
            let tens = amp.tensile * rng.jitter(0.05);
            stack.push_str(&format!(
                "{}_{suffix},{test},{:.2},{:.2},{:.2},{:.3e},{w},{l},{n},{load:.1},{tens:.2},{:.2},{:.2}\n",
                amp.name,
                amp.mass_empty,
                amp.mass_wine,
                amp.mass_oil,
                amp.volume,
                tens * 14.0,
                3.0 * rng.jitter(0.2),
            ));
        }
    }

    let mut hold_drop = String::from(
        "Amphorae,Test,Load (N),Max Tensile (MPa),Max Compressive (MPa),Factor of Safety\n",
    );
    for amp in &AMPHORAE {
        for (suffix, test) in [("hold_24h", "Hold"), ("drop_1m", "Drop")] {
            let load = 90.0 * amp.mass_wine * rng.jitter(0.15);
            let tens = amp.tensile * rng.jitter(0.08);
            hold_drop.push_str(&format!(
                "{}_{suffix},{test},{load:.1},{tens:.2},{:.2},{:.2}\n",
                amp.name,
                tens * 14.0,
                2.0 * rng.jitter(0.3),
            ));
        }
    }

    for (path, body) in [
        ("amphorae_comp-stack.csv", &stack),
        ("amphorae_comp-hold-drop.csv", &hold_drop),
    ] {
        let mut file = std::fs::File::create(path).expect("create sample file");
        file.write_all(body.as_bytes()).expect("write sample file");
        println!("Wrote {path}");
    }
}
