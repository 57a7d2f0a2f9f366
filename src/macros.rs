// src/macros.rs
#[macro_export]
macro_rules! s {
    // String shorthand
    () => {
        ::std::string::String::new()
    };
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

#[macro_export]
macro_rules! join {
    // Concatenate anything that derefs to &str into one owned String
    ($first:expr $(, $rest:expr)+ $(,)?) => {{
        let mut s = ::std::string::String::from($first);
        $(
            s.push_str($rest);
        )+
        s
    }};
}

/// Owned row/header from string-ish cells: `row!["A", "B", id]`.
#[macro_export]
macro_rules! row {
    () => {
        ::std::vec::Vec::<::std::string::String>::new()
    };
    ($($cell:expr),+ $(,)?) => {
        ::std::vec![$(::std::string::String::from($cell)),+]
    };
}
