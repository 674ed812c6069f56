fn main() {
    // ESP-IDF link arguments are only needed for the device build; host
    // builds (tests, fuzzing) compile the library without the toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
