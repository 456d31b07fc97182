//! Askama page templates and the flat view models they render.
//! Everything a template prints is computed here so templates stay logic-free.

use askama::Template;
use domains::{CommentView, FormErrors, Group, MediaStorage, Page, PostId, PostView, User};

const DATE_FORMAT: &str = "%d %b %Y";

pub struct Nav {
    pub username: Option<String>,
}

impl Nav {
    pub fn for_viewer(viewer: Option<&User>) -> Self {
        Self {
            username: viewer.map(|user| user.username.clone()),
        }
    }
}

pub struct GroupLink {
    pub title: String,
    pub slug: String,
}

pub struct PostCard {
    pub id: PostId,
    pub text: String,
    pub author: String,
    pub created: String,
    pub group: Option<GroupLink>,
    pub image_url: Option<String>,
}

impl PostCard {
    pub fn new(view: &PostView, media: &dyn MediaStorage) -> Self {
        Self {
            id: view.post.id,
            text: view.post.text.clone(),
            author: view.author.username.clone(),
            created: view.post.created_at.format(DATE_FORMAT).to_string(),
            group: view.group.as_ref().map(|group| GroupLink {
                title: group.title.clone(),
                slug: group.slug.clone(),
            }),
            image_url: view.post.image.as_deref().map(|path| media.url(path)),
        }
    }

    pub fn page(page: &Page<PostView>, media: &dyn MediaStorage) -> Vec<Self> {
        page.items.iter().map(|view| Self::new(view, media)).collect()
    }
}

pub struct PageLink {
    pub number: usize,
    pub current: bool,
}

pub struct PageNav {
    pub number: usize,
    pub num_pages: usize,
    pub previous: Option<usize>,
    pub next: Option<usize>,
    pub links: Vec<PageLink>,
}

impl PageNav {
    pub fn of<T>(page: &Page<T>) -> Self {
        Self {
            number: page.number,
            num_pages: page.num_pages,
            previous: page.previous_number(),
            next: page.next_number(),
            links: (1..=page.num_pages)
                .map(|number| PageLink {
                    number,
                    current: number == page.number,
                })
                .collect(),
        }
    }
}

pub struct CommentItem {
    pub author: String,
    pub text: String,
    pub created: String,
}

impl From<&CommentView> for CommentItem {
    fn from(view: &CommentView) -> Self {
        Self {
            author: view.author.username.clone(),
            text: view.comment.text.clone(),
            created: view.comment.created_at.format(DATE_FORMAT).to_string(),
        }
    }
}

pub struct GroupChoice {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

impl GroupChoice {
    /// `selected` is the raw submitted value, so a rejected choice stays selected.
    pub fn list(groups: &[Group], selected: &str) -> Vec<Self> {
        groups
            .iter()
            .map(|group| Self {
                id: group.id,
                title: group.title.clone(),
                selected: group.id.to_string() == selected.trim(),
            })
            .collect()
    }
}

/// Messages per form field, flattened for templates.
#[derive(Default)]
pub struct ErrorList {
    pub text: Vec<String>,
    pub group: Vec<String>,
    pub image: Vec<String>,
    pub username: Vec<String>,
    pub password: Vec<String>,
    pub password1: Vec<String>,
    pub password2: Vec<String>,
    pub non_field: Vec<String>,
}

impl From<&FormErrors> for ErrorList {
    fn from(errors: &FormErrors) -> Self {
        Self {
            text: errors.field("text"),
            group: errors.field("group"),
            image: errors.field("image"),
            username: errors.field("username"),
            password: errors.field("password"),
            password1: errors.field("password1"),
            password2: errors.field("password2"),
            non_field: errors.non_field(),
        }
    }
}

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexPage {
    pub nav: Nav,
    pub cards: Vec<PostCard>,
    pub pager: PageNav,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupPage {
    pub nav: Nav,
    pub title: String,
    pub description: String,
    pub cards: Vec<PostCard>,
    pub pager: PageNav,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfilePage {
    pub nav: Nav,
    pub author: String,
    pub post_count: usize,
    pub followers: usize,
    pub follows: usize,
    pub following: bool,
    /// Logged in and looking at someone else's profile
    pub can_follow: bool,
    pub cards: Vec<PostCard>,
    pub pager: PageNav,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailPage {
    pub nav: Nav,
    pub card: PostCard,
    pub title: String,
    pub author_posts: usize,
    pub comments: Vec<CommentItem>,
    pub can_edit: bool,
    pub can_comment: bool,
}

#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormPage {
    pub nav: Nav,
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupChoice>,
    /// Image already attached to the post being edited
    pub current_image: Option<String>,
    pub errors: ErrorList,
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowPage {
    pub nav: Nav,
    pub cards: Vec<PostCard>,
    pub pager: PageNav,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginPage {
    pub nav: Nav,
    pub username: String,
    pub next: String,
    pub errors: ErrorList,
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupPage {
    pub nav: Nav,
    pub username: String,
    pub errors: ErrorList,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutPage {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundPage {
    pub nav: Nav,
    /// Set for unmatched routes; missing records leave it out
    pub path: Option<String>,
}

#[derive(Template)]
#[template(path = "core/500.html")]
pub struct ServerErrorPage {
    pub nav: Nav,
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use domains::{MockMediaStorage, Paginator, Post};

    use super::*;

    fn view(id: i64, image: Option<&str>) -> PostView {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        PostView {
            post: Post {
                id,
                text: format!("post {id}"),
                created_at,
                author_id: 1,
                group_id: Some(2),
                image: image.map(str::to_string),
            },
            author: User {
                id: 1,
                username: "leo".into(),
                created_at,
            },
            group: Some(Group {
                id: 2,
                title: "Cats".into(),
                slug: "cats".into(),
                description: String::new(),
            }),
        }
    }

    fn media() -> MockMediaStorage {
        let mut media = MockMediaStorage::new();
        media
            .expect_url()
            .returning(|path| format!("/media/{path}"));
        media
    }

    #[test]
    fn card_resolves_image_url_and_date() {
        let card = PostCard::new(&view(1, Some("posts/ab/cd/x.gif")), &media());
        assert_eq!(card.image_url.as_deref(), Some("/media/posts/ab/cd/x.gif"));
        insta::assert_snapshot!(card.created, @"09 Mar 2024");
    }

    #[test]
    fn page_nav_marks_current_page() {
        let page = Paginator::new(10).page((1..=13).collect::<Vec<i32>>(), Some("2"));
        let nav = PageNav::of(&page);
        assert_eq!(nav.previous, Some(1));
        assert_eq!(nav.next, None);
        assert_eq!(nav.links.len(), 2);
        assert!(nav.links[1].current);
    }

    #[test]
    fn index_renders_cards_with_images() {
        let views = vec![view(1, Some("posts/ab/cd/x.gif")), view(2, None)];
        let page = Paginator::default().page(views, None);
        let media = media();
        let html = IndexPage {
            nav: Nav { username: None },
            cards: PostCard::page(&page, &media),
            pager: PageNav::of(&page),
        }
        .render()
        .unwrap();

        assert!(html.contains("post 1"));
        assert!(html.contains(r#"<img class="post-image" src="/media/posts/ab/cd/x.gif""#));
        assert!(html.contains(r#"href="/group/cats/""#));
        assert_eq!(html.matches("<img").count(), 1);
    }

    #[test]
    fn post_text_is_escaped() {
        let mut post = view(1, None);
        post.post.text = "<script>alert(1)</script>".into();
        let page = Paginator::default().page(vec![post], None);
        let html = IndexPage {
            nav: Nav { username: None },
            cards: PostCard::page(&page, &media()),
            pager: PageNav::of(&page),
        }
        .render()
        .unwrap();

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn form_keeps_rejected_group_selected() {
        let groups = vec![
            Group { id: 1, title: "Cats".into(), slug: "cats".into(), description: String::new() },
            Group { id: 2, title: "Dogs".into(), slug: "dogs".into(), description: String::new() },
        ];
        let choices = GroupChoice::list(&groups, " 2 ");
        assert!(!choices[0].selected);
        assert!(choices[1].selected);
    }
}
