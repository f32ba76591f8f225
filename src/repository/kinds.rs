//! Item kind classification by extension and by content.

/// Extensions that get an explicit uppercase type tag and a duration probe.
pub const AUDIO_EXTENSIONS: [&str; 5] = ["wav", "mp3", "ogg", "aiff", "flac"];

/// True for audio kinds. `ext` is matched case-insensitively, without the dot.
pub fn is_audio_extension(ext: &str) -> bool {
    AUDIO_EXTENSIONS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

/// Type tag for an audio extension: `wav` -> `WAV`.
pub fn audio_type_tag(ext: &str) -> String {
    ext.to_uppercase()
}

/// Repository type name for a known extension.
pub fn type_for_extension(ext: &str) -> Option<&'static str> {
    let name = match ext.to_lowercase().as_str() {
        "png" | "jpg" | "jpeg" | "tga" | "psd" | "tif" | "tiff" | "bmp" | "gif" | "exr"
        | "hdr" => "Texture2D",
        "mat" => "Material",
        "prefab" | "fbx" | "obj" | "blend" | "dae" | "3ds" => "GameObject",
        "unity" => "SceneAsset",
        "cs" => "MonoScript",
        "shader" | "hlsl" | "cginc" | "shadergraph" => "Shader",
        "anim" => "AnimationClip",
        "controller" => "AnimatorController",
        "overridecontroller" => "AnimatorOverrideController",
        "mask" => "AvatarMask",
        "asset" => "ScriptableObject",
        "physicmaterial" => "PhysicMaterial",
        "mixer" => "AudioMixerController",
        "rendertexture" => "RenderTexture",
        "cubemap" => "Cubemap",
        "ttf" | "otf" | "fontsettings" => "Font",
        "txt" | "json" | "xml" | "csv" | "yaml" | "yml" | "md" | "bytes" | "html" => "TextAsset",
        "mp4" | "mov" | "webm" | "avi" => "VideoClip",
        "asmdef" => "AssemblyDefinitionAsset",
        "spriteatlas" => "SpriteAtlas",
        "playable" => "TimelineAsset",
        "guiskin" => "GUISkin",
        "flare" => "Flare",
        "lighting" => "LightingSettings",
        _ => return None,
    };
    Some(name)
}

/// Type name for content sniffed with `infer`, used when the extension is unknown.
pub fn type_for_sniffed(kind: &infer::Type) -> Option<&'static str> {
    match kind.matcher_type() {
        infer::MatcherType::Image => Some("Texture2D"),
        infer::MatcherType::Audio => Some("AudioClip"),
        infer::MatcherType::Video => Some("VideoClip"),
        infer::MatcherType::Font => Some("Font"),
        infer::MatcherType::Archive => Some("DefaultAsset"),
        infer::MatcherType::Doc => Some("TextAsset"),
        _ => None,
    }
}

/// True for extensions that may hold textual references to other items.
pub fn may_hold_references(ext: &str) -> bool {
    matches!(
        ext.to_lowercase().as_str(),
        "prefab"
            | "unity"
            | "mat"
            | "asset"
            | "anim"
            | "controller"
            | "overridecontroller"
            | "mask"
            | "physicmaterial"
            | "mixer"
            | "rendertexture"
            | "spriteatlas"
            | "playable"
            | "guiskin"
            | "flare"
            | "lighting"
            | "shadergraph"
            | "fontsettings"
            | "cubemap"
    )
}
