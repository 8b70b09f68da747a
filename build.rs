fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // ESP-IDF link environment is only needed for the on-target build;
    // host builds (tests, simulation) skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
