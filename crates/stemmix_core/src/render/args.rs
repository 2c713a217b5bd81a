//! Render engine command-line builder.
//!
//! Argument order is fixed because the engine applies options to the
//! input or output that follows them:
//!
//! ```text
//! -i <stem0> -i <stem1> ... -filter_complex <graph> -map [out] -ar <rate>
//!     [codec flags] -y <output>
//! ```
//!
//! Codec flags by container:
//!
//! - **wav**: `-acodec pcm_s<bits>le`
//! - **aiff**: `-acodec pcm_s<bits>be`
//! - **mp3**: `-b:a <bitrate>` (320k unless configured)
//! - **flac**: `-sample_fmt s16|s32`
//! - **ogg**: container defaults

use std::ffi::OsString;
use std::path::Path;

use crate::graph::FilterGraph;
use crate::models::{ContainerFormat, RenderSettings, StemInput};

/// Bitrate used for mp3 output.
pub const DEFAULT_MP3_BITRATE: &str = "320k";

/// Builder for render engine arguments.
pub struct RenderArgsBuilder<'a> {
    graph: &'a FilterGraph,
    stems: &'a [StemInput],
    settings: &'a RenderSettings,
    output_path: &'a Path,
    mp3_bitrate: &'a str,
}

impl<'a> RenderArgsBuilder<'a> {
    /// Create a new args builder.
    pub fn new(
        graph: &'a FilterGraph,
        stems: &'a [StemInput],
        settings: &'a RenderSettings,
        output_path: &'a Path,
    ) -> Self {
        Self {
            graph,
            stems,
            settings,
            output_path,
            mp3_bitrate: DEFAULT_MP3_BITRATE,
        }
    }

    /// Override the mp3 bitrate (engine syntax, e.g. "256k").
    pub fn mp3_bitrate(mut self, bitrate: &'a str) -> Self {
        self.mp3_bitrate = bitrate;
        self
    }

    /// Build the argument list (without the executable).
    pub fn build(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        // Inputs, in stem order
        for stem in self.stems {
            args.push("-i".into());
            args.push(stem.file_path.as_os_str().to_owned());
        }

        // Graph and its single output
        args.push("-filter_complex".into());
        args.push(self.graph.as_str().into());
        args.push("-map".into());
        args.push(self.graph.map_target().into());

        args.push("-ar".into());
        args.push(self.settings.sample_rate_hz.to_string().into());

        self.add_codec_flags(&mut args);

        // Always overwrite
        args.push("-y".into());
        args.push(self.output_path.as_os_str().to_owned());

        args
    }

    fn add_codec_flags(&self, args: &mut Vec<OsString>) {
        let bits = self.settings.bit_depth;
        match self.settings.container_format {
            ContainerFormat::Wav => {
                args.push("-acodec".into());
                args.push(format!("pcm_s{}le", bits).into());
            }
            ContainerFormat::Aiff => {
                args.push("-acodec".into());
                args.push(format!("pcm_s{}be", bits).into());
            }
            ContainerFormat::Mp3 => {
                args.push("-b:a".into());
                args.push(self.mp3_bitrate.into());
            }
            ContainerFormat::Flac => {
                args.push("-sample_fmt".into());
                args.push(if bits <= 16 { "s16" } else { "s32" }.into());
            }
            ContainerFormat::Ogg => {}
        }
    }
}

/// Render a command line for logs, quoting arguments that contain spaces
/// or graph metacharacters.
pub fn format_args_pretty(program: &Path, args: &[OsString]) -> String {
    let mut parts = vec![program.display().to_string()];
    for arg in args {
        let arg = arg.to_string_lossy();
        if arg.is_empty() || arg.contains([' ', ';', '|', '[', ']']) {
            parts.push(format!("\"{}\"", arg));
        } else {
            parts.push(arg.to_string());
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_filter_graph;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().to_string()).collect()
    }

    #[test]
    fn wav_args_in_engine_order() {
        let stems = vec![
            StemInput::new("/stems/drums.wav").with_gain(0.8),
            StemInput::new("/stems/bass.wav").with_gain(0.5),
        ];
        let graph = build_filter_graph(&stems).unwrap();
        let settings = RenderSettings::new(44100, 16, ContainerFormat::Wav);
        let args = RenderArgsBuilder::new(&graph, &stems, &settings, Path::new("/mix/out.wav")).build();

        assert_eq!(
            strings(&args),
            vec![
                "-i",
                "/stems/drums.wav",
                "-i",
                "/stems/bass.wav",
                "-filter_complex",
                graph.as_str(),
                "-map",
                "[out]",
                "-ar",
                "44100",
                "-acodec",
                "pcm_s16le",
                "-y",
                "/mix/out.wav",
            ]
        );
    }

    #[test]
    fn codec_flags_follow_container() {
        let stems = vec![StemInput::new("a.wav")];
        let graph = build_filter_graph(&stems).unwrap();
        let out = Path::new("out");

        let flags = |settings: RenderSettings| {
            let args = strings(&RenderArgsBuilder::new(&graph, &stems, &settings, out).build());
            let ar = args.iter().position(|a| a == "-ar").unwrap();
            let y = args.iter().position(|a| a == "-y").unwrap();
            args[ar + 2..y].to_vec()
        };

        assert_eq!(
            flags(RenderSettings::new(48000, 24, ContainerFormat::Wav)),
            vec!["-acodec", "pcm_s24le"]
        );
        assert_eq!(
            flags(RenderSettings::new(48000, 32, ContainerFormat::Aiff)),
            vec!["-acodec", "pcm_s32be"]
        );
        assert_eq!(
            flags(RenderSettings::new(44100, 16, ContainerFormat::Mp3)),
            vec!["-b:a", "320k"]
        );
        assert_eq!(
            flags(RenderSettings::new(96000, 24, ContainerFormat::Flac)),
            vec!["-sample_fmt", "s32"]
        );
        assert!(flags(RenderSettings::new(48000, 16, ContainerFormat::Ogg)).is_empty());
    }

    #[test]
    fn custom_mp3_bitrate() {
        let stems = vec![StemInput::new("a.wav")];
        let graph = build_filter_graph(&stems).unwrap();
        let settings = RenderSettings::new(44100, 16, ContainerFormat::Mp3);
        let args = RenderArgsBuilder::new(&graph, &stems, &settings, Path::new("o.mp3"))
            .mp3_bitrate("192k")
            .build();
        assert!(strings(&args).contains(&"192k".to_string()));
    }

    #[test]
    fn pretty_format_quotes_graph() {
        let args: Vec<OsString> = vec!["-map".into(), "[out]".into(), "-y".into(), "my mix.wav".into()];
        assert_eq!(
            format_args_pretty(Path::new("ffmpeg"), &args),
            "ffmpeg -map \"[out]\" -y \"my mix.wav\""
        );
    }
}
