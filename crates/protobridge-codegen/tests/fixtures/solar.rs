// Declarations for the solar system integration test. Parsed, never compiled.

enum Status {
    Running,
    Paused,
}

enum StatusString {
    Running = "RunnN",
    Paused = "PausD",
}

struct Moon {
    moon_name: String,
}

struct Star {
    size: union!(f64 | Star),
    status: Status,
    children: Vec<Star>,
    kind: lit!("Constant"),
    novalue: Option<null>,
    star_name: String,
}

struct Planet {
    planet_name: String,
    moons: Vec<Moon>,
    mood: union!("happy" | "sad" | undefined),
    state: StatusString,
    moon: union!(Moon | null),
    flag: Alias,
}

type PlanetOrStar = union!(Planet | Star);

type Alias = union!(bool | null);

struct SolarSystem {
    sun: PlanetOrStar,
    bodies: Vec<PlanetOrStar>,
    other: union!(Star | Planet),
    value: union!(f64 | bool | null),
}
