use maud::{html, Markup, Render};

pub const ADSENSE_SCRIPT_SRC: &str = "https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js";
pub const DEFAULT_AD_CLIENT: &str = "ca-pub-4058854109696799";
const DEFAULT_CONTAINER_CLASS: &str = "ads-container";

/// Runs once the ad library has loaded. Init errors are logged in the browser, never retried.
const INIT_ADS_JS: &str = "try { (window.adsbygoogle = window.adsbygoogle || []).push({}); } \
catch (error) { console.error(\"AdSense initialization error:\", error); }";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptTag {
    pub src: String,
    pub is_async: bool,
    pub cross_origin: Option<&'static str>,
    pub ad_client: Option<String>,
    pub onload: Option<&'static str>,
}

/// Script tags of a rendered document head, in attach order.
#[derive(Debug, Default)]
pub struct Head {
    scripts: Vec<(ScriptId, ScriptTag)>,
    next_id: u64,
}

impl Head {
    pub fn append_script(&mut self, tag: ScriptTag) -> ScriptId {
        self.next_id += 1;
        let id = ScriptId(self.next_id);
        self.scripts.push((id, tag));
        id
    }

    pub fn remove_script(&mut self, id: ScriptId) -> bool {
        let before = self.scripts.len();
        self.scripts.retain(|(sid, _)| *sid != id);
        self.scripts.len() != before
    }

    pub fn scripts(&self) -> impl Iterator<Item = &ScriptTag> {
        self.scripts.iter().map(|(_, tag)| tag)
    }
}

impl Render for Head {
    fn render(&self) -> Markup {
        html! {
            @for tag in self.scripts() {
                script
                    src=(tag.src)
                    async[tag.is_async]
                    crossorigin=[tag.cross_origin]
                    data-ad-client=[tag.ad_client.as_deref()]
                    onload=[tag.onload] {}
            }
        }
    }
}

/// Ad network account used for every slot on a page.
#[derive(Debug, Clone)]
pub struct AdClient {
    pub script_src: String,
    pub publisher_id: String,
}

impl Default for AdClient {
    fn default() -> Self {
        Self {
            script_src: ADSENSE_SCRIPT_SRC.into(),
            publisher_id: DEFAULT_AD_CLIENT.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdSlot {
    pub slot_id: String,
    pub class_name: Option<String>,
}

/// An ad slot attached to a page. Owns one script tag on the head until unmounted.
#[derive(Debug)]
pub struct MountedAd {
    script: ScriptId,
    publisher_id: String,
    slot: AdSlot,
}

impl AdClient {
    pub fn mount(&self, head: &mut Head, slot: AdSlot) -> MountedAd {
        let script = head.append_script(ScriptTag {
            src: self.script_src.clone(),
            is_async: true,
            cross_origin: Some("anonymous"),
            ad_client: Some(self.publisher_id.clone()),
            onload: Some(INIT_ADS_JS),
        });
        MountedAd {
            script,
            publisher_id: self.publisher_id.clone(),
            slot,
        }
    }
}

impl MountedAd {
    pub fn unmount(self, head: &mut Head) {
        head.remove_script(self.script);
    }
}

impl Render for MountedAd {
    fn render(&self) -> Markup {
        let class = self.slot.class_name.as_deref().unwrap_or(DEFAULT_CONTAINER_CLASS);
        html! {
            div class=(class) {
                ins class="adsbygoogle"
                    style="display: block"
                    data-ad-client=(self.publisher_id)
                    data-ad-slot=(self.slot.slot_id)
                    data-ad-format="auto"
                    data-full-width-responsive="true" {}
            }
        }
    }
}
