fn main() {
    // Only device builds need the ESP-IDF environment; host builds
    // (tests, simulation) compile without it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
