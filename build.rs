fn main() {
    // Only the ESP-IDF firmware build needs the IDF environment exported;
    // host builds (unit + integration tests) skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
