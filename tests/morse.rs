//! Morse generator scenario: the child walks a sentence and yields one
//! on/off pixel at a time, keeping its loop state in plain locals instead of
//! an inside-out callback structure. The parent concatenates the pixels into
//! a transmission.

use std::ptr::NonNull;

use switchback::{create, recv, yield_to, Channel, Payload};

/// Pixel runs per character: a dot is ` - `, a dash ` --- `, with an extra
/// trailing space closing each letter. Unknown characters transmit as the
/// inter-word gap.
fn pixels_for(letter: char) -> &'static str {
    match letter.to_ascii_uppercase() {
        'A' => " - ---  ",
        'B' => " --- - - -  ",
        'C' => " --- - --- -  ",
        'D' => " --- - -  ",
        'E' => " -  ",
        'F' => " - - --- -  ",
        'G' => " --- --- -  ",
        'H' => " - - - -  ",
        'I' => " - -  ",
        'J' => " --- --- --- -  ",
        'K' => " --- - ---  ",
        'L' => " - --- - -  ",
        'M' => " --- ---  ",
        'N' => " --- -  ",
        'O' => " --- --- ---  ",
        'P' => " - --- --- -  ",
        'Q' => " --- --- - ---  ",
        'R' => " - --- -  ",
        'S' => " - - -  ",
        'T' => " ---  ",
        'U' => " - - ---  ",
        'V' => " - - - ---  ",
        'W' => " - --- ---  ",
        'X' => " --- - - ---  ",
        'Y' => " --- - --- ---  ",
        'Z' => " --- --- - -  ",
        '1' => " - --- --- --- ---  ",
        '2' => " - - --- --- ---  ",
        '3' => " - - - --- ---  ",
        '4' => " - - - - ---  ",
        '5' => " - - - - -  ",
        '6' => " --- - - - -  ",
        '7' => " --- --- - - -  ",
        '8' => " --- --- --- - -  ",
        '9' => " --- --- --- --- -  ",
        '0' => " --- --- --- --- ---  ",
        _ => "      ",
    }
}

fn morse_generator(parent: NonNull<Channel>, arg: Payload) {
    let sentence = unsafe { arg.unwrap().cast::<String>().as_ref() };

    for letter in sentence.chars() {
        for pixel in pixels_for(letter).chars() {
            unsafe { yield_to(parent, Some(NonNull::from(&pixel).cast())) };
        }
    }
}

fn transmit(sentence: &str) -> String {
    let sentence = String::from(sentence);
    let child = unsafe { create(morse_generator, Some(NonNull::from(&sentence).cast())) };

    let mut transmission = String::new();
    while let Some(datum) = unsafe { recv(child) } {
        transmission.push(unsafe { *datum.cast::<char>().as_ptr() });
    }
    transmission.push('\n');

    transmission
}

#[test]
fn encodes_test() {
    assert_eq!(transmit("test"), " ---   -   - - -   ---  \n");
}

#[test]
fn encodes_sos() {
    assert_eq!(transmit("sos"), " - - -   --- --- ---   - - -  \n");
}

#[test]
fn case_is_insignificant() {
    assert_eq!(transmit("TEST"), transmit("test"));
}

#[test]
fn unknown_characters_become_gaps() {
    assert_eq!(transmit("#"), "      \n");
}
