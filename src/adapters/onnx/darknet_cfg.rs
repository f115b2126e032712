//! Lector mínimo del formato `.cfg` de darknet.
//!
//! Sólo se usa para conocer el tamaño de entrada (`[net]`) y el número de
//! clases de las capas `[yolo]`; la topología la aporta el propio ONNX.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::NetworkSpec;

pub fn parse_network_spec(text: &str) -> DomainResult<NetworkSpec> {
    let mut section: Option<String> = None;
    let mut seen_net = false;
    let mut width = None;
    let mut height = None;
    let mut channels = 3;
    let mut yolo_layers = 0;
    let mut classes: Option<usize> = None;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.split(&['#', ';'][..]).next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_ascii_lowercase();
            match name.as_str() {
                "net" | "network" => seen_net = true,
                "yolo" | "region" => yolo_layers += 1,
                _ => {}
            }
            section = Some(name);
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(DomainError::InvalidInput(format!(
                "cfg line {}: expected key=value, got {:?}",
                lineno + 1,
                line
            )));
        };
        let (key, value) = (key.trim(), value.trim());

        match (section.as_deref(), key) {
            (Some("net" | "network"), "width") => width = Some(parse_num(value, lineno)?),
            (Some("net" | "network"), "height") => height = Some(parse_num(value, lineno)?),
            (Some("net" | "network"), "channels") => channels = parse_num(value, lineno)?,
            (Some("yolo" | "region"), "classes") => {
                let n = parse_num(value, lineno)? as usize;
                if let Some(prev) = classes {
                    if prev != n {
                        return Err(DomainError::InvalidInput(format!(
                            "cfg line {}: classes={} disagrees with earlier classes={}",
                            lineno + 1,
                            n,
                            prev
                        )));
                    }
                }
                classes = Some(n);
            }
            _ => {}
        }
    }

    if !seen_net {
        return Err(DomainError::InvalidInput("cfg has no [net] section".into()));
    }
    let (Some(width), Some(height)) = (width, height) else {
        return Err(DomainError::InvalidInput("cfg [net] lacks width/height".into()));
    };
    if width == 0 || height == 0 {
        return Err(DomainError::InvalidInput("cfg [net] width/height must be positive".into()));
    }

    Ok(NetworkSpec { width, height, channels, yolo_layers, classes })
}

fn parse_num(value: &str, lineno: usize) -> DomainResult<u32> {
    value.parse().map_err(|_| {
        DomainError::InvalidInput(format!("cfg line {}: {:?} is not a number", lineno + 1, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const YOLOV3_HEAD: &str = "\
[net]
# Testing
batch=1
subdivisions=1
width=416
height=416
channels=3
momentum=0.9

[convolutional]
batch_normalize=1
filters=32
size=3
activation=leaky

[yolo]
mask = 6,7,8
anchors = 10,13,  16,30,  33,23
classes=80
num=9

[yolo]
mask = 3,4,5
classes=80
";

    #[test]
    fn reads_net_size_and_yolo_classes() {
        let spec = parse_network_spec(YOLOV3_HEAD).unwrap();
        assert_eq!(
            spec,
            NetworkSpec { width: 416, height: 416, channels: 3, yolo_layers: 2, classes: Some(80) }
        );
    }

    #[test]
    fn missing_net_section_is_rejected() {
        let err = parse_network_spec("[yolo]\nclasses=80\n").unwrap_err();
        assert!(err.to_string().contains("[net]"));
    }

    #[test]
    fn inconsistent_classes_are_rejected() {
        let cfg = "[net]\nwidth=320\nheight=320\n[yolo]\nclasses=80\n[yolo]\nclasses=20\n";
        assert!(parse_network_spec(cfg).is_err());
    }

    #[test]
    fn garbage_line_reports_line_number() {
        let err = parse_network_spec("[net]\nwidth=416\nthis is not cfg\n").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }
}
