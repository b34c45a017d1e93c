#![no_main]

use libfuzzer_sys::fuzz_target;
use statespice_netlist::parse;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        match parse(s) {
            Ok(netlist) => {
                // names are unique, so each element finds itself
                for (element_ref, element) in netlist.iter() {
                    assert_eq!(netlist.find(&element.name), Some(element_ref));
                }
            }
            Err(e) => {
                if let Some(span) = e.error_span() {
                    assert!(span.start <= s.len());
                }
            }
        }
    }
});
